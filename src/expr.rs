//! TEAL program expressions
//!
//! A program is a tree of [`Expr`] nodes. The same tree is handed to the
//! compiler ([`crate::compile`]) and to the evaluator ([`crate::eval`]).
//!
//! Constructors in [`dsl`] read like the contract source:
//!
//! ```
//! use hello_teal::expr::dsl::*;
//!
//! let program = if_(eq(txn_application_id(), int(0)), approve(), reject());
//! assert_eq!(program.to_string(), "(if (== txn.ApplicationID 0) (return 1) (return 0))");
//! ```

use std::fmt;

/// Stack type of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TealType {
    Uint64,
    Bytes,
    /// Leaves nothing on the stack
    None,
}

impl fmt::Display for TealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TealType::Uint64 => write!(f, "uint64"),
            TealType::Bytes => write!(f, "bytes"),
            TealType::None => write!(f, "none"),
        }
    }
}

/// Transaction fields readable with `txn`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnField {
    ApplicationID,
    Sender,
}

impl TxnField {
    pub fn name(self) -> &'static str {
        match self {
            TxnField::ApplicationID => "ApplicationID",
            TxnField::Sender => "Sender",
        }
    }

    pub fn teal_type(self) -> TealType {
        match self {
            TxnField::ApplicationID => TealType::Uint64,
            TxnField::Sender => TealType::Bytes,
        }
    }
}

/// Ledger fields readable with `global`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalField {
    LatestTimestamp,
}

impl GlobalField {
    pub fn name(self) -> &'static str {
        match self {
            GlobalField::LatestTimestamp => "LatestTimestamp",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Add,
    Div,
}

impl BinOp {
    pub fn opcode(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Add => "+",
            BinOp::Div => "/",
        }
    }
}

/// Program expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(u64),
    Bytes(Vec<u8>),
    Txn(TxnField),
    Global(GlobalField),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Write `value` under `key` in the application's global state
    GlobalPut(Box<Expr>, Box<Expr>),
    Seq(Vec<Expr>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Return(Box<Expr>),
}

impl Expr {
    /// Whether control never falls through this expression
    pub fn terminates(&self) -> bool {
        match self {
            Expr::Return(_) => true,
            Expr::Seq(items) => items.iter().any(Expr::terminates),
            Expr::If(_, then, otherwise) => then.terminates() && otherwise.terminates(),
            _ => false,
        }
    }

    /// Stack type left by this expression.
    ///
    /// A branch that never falls through takes no part in the type of an
    /// `If`; the compiler applies the same rule.
    pub fn teal_type(&self) -> TealType {
        match self {
            Expr::Int(_) | Expr::Global(_) | Expr::Binary(..) => TealType::Uint64,
            Expr::Bytes(_) => TealType::Bytes,
            Expr::Txn(field) => field.teal_type(),
            Expr::GlobalPut(..) | Expr::Return(_) => TealType::None,
            Expr::Seq(items) => items.last().map(Expr::teal_type).unwrap_or(TealType::None),
            Expr::If(_, then, otherwise) => match (then.terminates(), otherwise.terminates()) {
                (true, true) => TealType::None,
                (true, false) => otherwise.teal_type(),
                (false, _) => then.teal_type(),
            },
        }
    }
}

fn write_bytes(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    match std::str::from_utf8(bytes) {
        Ok(s) => write!(f, "{:?}", s),
        Err(_) => write!(f, "0x{}", hex::encode(bytes)),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Bytes(b) => write_bytes(f, b),
            Expr::Txn(field) => write!(f, "txn.{}", field.name()),
            Expr::Global(field) => write!(f, "global.{}", field.name()),
            Expr::Binary(op, lhs, rhs) => write!(f, "({} {} {})", op.opcode(), lhs, rhs),
            Expr::GlobalPut(key, value) => write!(f, "(app_global_put {} {})", key, value),
            Expr::Seq(items) => {
                write!(f, "(seq")?;
                for item in items {
                    write!(f, " {}", item)?;
                }
                write!(f, ")")
            }
            Expr::If(cond, then, otherwise) => {
                write!(f, "(if {} {} {})", cond, then, otherwise)
            }
            Expr::Return(value) => write!(f, "(return {})", value),
        }
    }
}

/// Constructors for building programs
pub mod dsl {
    use super::{BinOp, Expr, GlobalField, TxnField};

    pub fn int(n: u64) -> Expr {
        Expr::Int(n)
    }

    pub fn bytes(b: impl AsRef<[u8]>) -> Expr {
        Expr::Bytes(b.as_ref().to_vec())
    }

    pub fn txn_application_id() -> Expr {
        Expr::Txn(TxnField::ApplicationID)
    }

    pub fn txn_sender() -> Expr {
        Expr::Txn(TxnField::Sender)
    }

    pub fn latest_timestamp() -> Expr {
        Expr::Global(GlobalField::LatestTimestamp)
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(BinOp::Eq, Box::new(lhs), Box::new(rhs))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(BinOp::Add, Box::new(lhs), Box::new(rhs))
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(BinOp::Div, Box::new(lhs), Box::new(rhs))
    }

    pub fn global_put(key: Expr, value: Expr) -> Expr {
        Expr::GlobalPut(Box::new(key), Box::new(value))
    }

    pub fn seq(items: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Seq(items.into_iter().collect())
    }

    pub fn if_(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
        Expr::If(Box::new(cond), Box::new(then), Box::new(otherwise))
    }

    pub fn ret(value: Expr) -> Expr {
        Expr::Return(Box::new(value))
    }

    /// `return 1`
    pub fn approve() -> Expr {
        ret(int(1))
    }

    /// `return 0`
    pub fn reject() -> Expr {
        ret(int(0))
    }
}

#[cfg(test)]
mod tests {
    use super::dsl::*;
    use super::*;

    #[test]
    fn test_terminates() {
        assert!(approve().terminates());
        assert!(!int(1).terminates());
        assert!(seq([global_put(bytes("k"), int(1)), approve()]).terminates());
        assert!(!if_(int(1), approve(), int(0)).terminates());
        assert!(if_(int(1), approve(), reject()).terminates());
    }

    #[test]
    fn test_display() {
        let e = seq([
            global_put(bytes("Message"), bytes("hi")),
            global_put(bytes([0xffu8, 0x00]), add(latest_timestamp(), int(1))),
            approve(),
        ]);
        assert_eq!(
            e.to_string(),
            "(seq (app_global_put \"Message\" \"hi\") \
             (app_global_put 0xff00 (+ global.LatestTimestamp 1)) (return 1))"
        );
    }

    #[test]
    fn test_teal_type_skips_terminating_branch() {
        let cond = eq(txn_application_id(), int(0));
        assert_eq!(if_(cond.clone(), approve(), bytes("x")).teal_type(), TealType::Bytes);
        assert_eq!(if_(cond.clone(), int(1), reject()).teal_type(), TealType::Uint64);
        assert_eq!(
            if_(cond.clone(), seq([global_put(bytes("k"), int(1)), approve()]), txn_sender()).teal_type(),
            TealType::Bytes
        );
        assert_eq!(if_(cond, approve(), reject()).teal_type(), TealType::None);
        assert_eq!(seq([global_put(bytes("k"), int(1)), int(2)]).teal_type(), TealType::Uint64);
    }

    #[test]
    fn test_txn_field_types() {
        assert_eq!(TxnField::ApplicationID.teal_type(), TealType::Uint64);
        assert_eq!(TxnField::Sender.teal_type(), TealType::Bytes);
    }
}
