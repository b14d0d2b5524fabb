//! Program evaluator
//!
//! Runs an [`Expr`] against a single [`Invocation`] and reports the decision
//! together with the global-state writes the program made. State is returned
//! explicitly rather than written to a store.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::EvalError;
use crate::expr::{BinOp, Expr, GlobalField, TealType, TxnField};

/// One call into a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// 0 on the creation call
    pub application_id: u64,
    pub sender: String,
    /// Seconds since the epoch
    pub latest_timestamp: u64,
}

impl Invocation {
    pub fn new(application_id: u64, sender: impl Into<String>, latest_timestamp: u64) -> Self {
        Self {
            application_id,
            sender: sender.into(),
            latest_timestamp,
        }
    }

    pub fn is_creation(&self) -> bool {
        self.application_id == 0
    }
}

/// Stack / state value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TealValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

impl TealValue {
    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        TealValue::Bytes(b.as_ref().to_vec())
    }

    fn as_uint(&self, context: &'static str) -> Result<u64, EvalError> {
        match self {
            TealValue::Uint(n) => Ok(*n),
            TealValue::Bytes(_) => Err(EvalError::TypeMismatch {
                context,
                expected: TealType::Uint64,
            }),
        }
    }
}

impl fmt::Display for TealValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TealValue::Uint(n) => write!(f, "{}", n),
            TealValue::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "0x{}", hex::encode(b)),
            },
        }
    }
}

/// Global-state writes produced by one call
pub type GlobalState = BTreeMap<String, TealValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

/// Result of evaluating a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub decision: Decision,
    pub global_state: GlobalState,
}

impl Outcome {
    pub fn approved(&self) -> bool {
        self.decision == Decision::Approve
    }
}

/// Control flow out of a sub-expression
enum Flow {
    Value(Option<TealValue>),
    Return(u64),
}

/// Evaluate `program` for `invocation`
pub fn evaluate(program: &Expr, invocation: &Invocation) -> Result<Outcome, EvalError> {
    let mut machine = Machine {
        invocation,
        state: GlobalState::new(),
    };

    let code = match machine.run(program)? {
        Flow::Return(code) => code,
        // a trailing uint64 is returned implicitly, as the compiler does
        Flow::Value(Some(value)) => value.as_uint("return")?,
        Flow::Value(None) => return Err(EvalError::NoReturn),
    };

    let decision = if code != 0 {
        Decision::Approve
    } else {
        Decision::Reject
    };
    trace!(?decision, writes = machine.state.len(), "evaluated program");

    Ok(Outcome {
        decision,
        global_state: machine.state,
    })
}

struct Machine<'a> {
    invocation: &'a Invocation,
    state: GlobalState,
}

macro_rules! value {
    ($self:ident, $expr:expr) => {
        match $self.run($expr)? {
            Flow::Value(Some(v)) => v,
            Flow::Value(None) => return Err(EvalError::NoReturn),
            Flow::Return(code) => return Ok(Flow::Return(code)),
        }
    };
}

impl Machine<'_> {
    fn run(&mut self, expr: &Expr) -> Result<Flow, EvalError> {
        let value = match expr {
            Expr::Int(n) => TealValue::Uint(*n),
            Expr::Bytes(b) => TealValue::Bytes(b.clone()),
            Expr::Txn(TxnField::ApplicationID) => TealValue::Uint(self.invocation.application_id),
            Expr::Txn(TxnField::Sender) => TealValue::bytes(&self.invocation.sender),
            Expr::Global(GlobalField::LatestTimestamp) => {
                TealValue::Uint(self.invocation.latest_timestamp)
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = value!(self, lhs);
                let r = value!(self, rhs);
                binary(*op, l, r)?
            }
            Expr::GlobalPut(key, val) => {
                let k = match value!(self, key) {
                    TealValue::Bytes(b) => {
                        String::from_utf8(b).map_err(|e| EvalError::InvalidKey(hex::encode(e.as_bytes())))?
                    }
                    TealValue::Uint(_) => {
                        return Err(EvalError::TypeMismatch {
                            context: "app_global_put key",
                            expected: TealType::Bytes,
                        })
                    }
                };
                let v = value!(self, val);
                trace!(key = %k, value = %v, "app_global_put");
                self.state.insert(k, v);
                return Ok(Flow::Value(None));
            }
            Expr::Seq(items) => {
                let mut last = None;
                for item in items {
                    match self.run(item)? {
                        Flow::Value(v) => last = v,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                return Ok(Flow::Value(last));
            }
            Expr::If(cond, then, otherwise) => {
                let c = value!(self, cond).as_uint("if condition")?;
                return if c != 0 {
                    self.run(then)
                } else {
                    self.run(otherwise)
                };
            }
            Expr::Return(val) => {
                let code = value!(self, val).as_uint("return")?;
                return Ok(Flow::Return(code));
            }
        };
        Ok(Flow::Value(Some(value)))
    }
}

fn binary(op: BinOp, lhs: TealValue, rhs: TealValue) -> Result<TealValue, EvalError> {
    match op {
        BinOp::Eq => match (&lhs, &rhs) {
            (TealValue::Uint(_), TealValue::Uint(_)) | (TealValue::Bytes(_), TealValue::Bytes(_)) => {
                Ok(TealValue::Uint((lhs == rhs) as u64))
            }
            _ => Err(EvalError::TypeMismatch {
                context: "==",
                expected: match lhs {
                    TealValue::Uint(_) => TealType::Uint64,
                    TealValue::Bytes(_) => TealType::Bytes,
                },
            }),
        },
        BinOp::Add => {
            let (l, r) = (lhs.as_uint("+")?, rhs.as_uint("+")?);
            l.checked_add(r).map(TealValue::Uint).ok_or(EvalError::Overflow)
        }
        BinOp::Div => {
            let (l, r) = (lhs.as_uint("/")?, rhs.as_uint("/")?);
            l.checked_div(r).map(TealValue::Uint).ok_or(EvalError::DivisionByZero)
        }
    }
}
