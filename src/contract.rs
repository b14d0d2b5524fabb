//! The hello-world application contract
//!
//! Creation calls are approved without touching state. Every later call
//! records the current year, the caller and a greeting in global state and
//! is approved. Clear-state calls are always approved.

use crate::error::EvalError;
use crate::eval::{evaluate, Invocation, Outcome};
use crate::expr::dsl::*;
use crate::expr::Expr;

pub const SECONDS_PER_YEAR: u64 = 60 * 60 * 24 * 365;
pub const EPOCH_YEAR: u64 = 1970;

pub const YEAR_KEY: &str = "Year";
pub const CALLER_KEY: &str = "Caller";
pub const MESSAGE_KEY: &str = "Message";
pub const MESSAGE: &str = "Hello World!";

/// Approval program
pub fn approval() -> Expr {
    if_(
        eq(txn_application_id(), int(0)),
        approve(),
        seq([
            global_put(
                bytes(YEAR_KEY),
                add(int(EPOCH_YEAR), div(latest_timestamp(), int(SECONDS_PER_YEAR))),
            ),
            global_put(bytes(CALLER_KEY), txn_sender()),
            global_put(bytes(MESSAGE_KEY), bytes(MESSAGE)),
            approve(),
        ]),
    )
}

/// Clear-state program
pub fn clear() -> Expr {
    approve()
}

pub fn evaluate_approval(invocation: &Invocation) -> Result<Outcome, EvalError> {
    evaluate(&approval(), invocation)
}

pub fn evaluate_clear(invocation: &Invocation) -> Result<Outcome, EvalError> {
    evaluate(&clear(), invocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Decision, TealValue};

    #[test]
    fn test_creation_call_approves_without_state() {
        for ts in [0, 1_700_000_000, u64::MAX] {
            let invocation = Invocation::new(0, "CREATOR", ts);
            assert!(invocation.is_creation());
            let outcome = evaluate_approval(&invocation).unwrap();
            assert_eq!(outcome.decision, Decision::Approve);
            assert!(outcome.global_state.is_empty());
        }
    }

    #[test]
    fn test_call_writes_three_keys() {
        let invocation = Invocation::new(42, "ADDR1", 31_536_000);
        assert!(!invocation.is_creation());
        let outcome = evaluate_approval(&invocation).unwrap();
        assert_eq!(outcome.decision, Decision::Approve);

        let keys: Vec<_> = outcome.global_state.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Caller", "Message", "Year"]);
        assert_eq!(outcome.global_state["Year"], TealValue::Uint(1971));
        assert_eq!(outcome.global_state["Caller"], TealValue::bytes("ADDR1"));
        assert_eq!(outcome.global_state["Message"], TealValue::bytes("Hello World!"));
    }

    #[test]
    fn test_year_at_epoch() {
        let outcome = evaluate_approval(&Invocation::new(1, "ADDR1", 0)).unwrap();
        assert_eq!(outcome.global_state["Year"], TealValue::Uint(1970));
    }

    #[test]
    fn test_year_floors() {
        let cases = [
            (SECONDS_PER_YEAR - 1, 1970),
            (SECONDS_PER_YEAR, 1971),
            (1_700_000_000, 1970 + 1_700_000_000 / SECONDS_PER_YEAR),
        ];
        for (ts, year) in cases {
            let outcome = evaluate_approval(&Invocation::new(7, "X", ts)).unwrap();
            assert_eq!(outcome.global_state["Year"], TealValue::Uint(year));
        }
    }

    #[test]
    fn test_clear_always_approves() {
        for invocation in [
            Invocation::new(0, "", 0),
            Invocation::new(9, "ADDR1", 123),
            Invocation::new(u64::MAX, "Z", u64::MAX),
        ] {
            let outcome = evaluate_clear(&invocation).unwrap();
            assert!(outcome.approved());
            assert!(outcome.global_state.is_empty());
        }
    }
}
