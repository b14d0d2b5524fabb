//! Error types for compilation, evaluation and emission

use std::path::PathBuf;

use crate::expr::TealType;

/// Errors raised while lowering an [`Expr`](crate::Expr) to TEAL
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Requested version outside the supported range
    #[error("unsupported teal version {0} (supported: {min}..={max})", min = crate::compile::MIN_VERSION, max = crate::compile::MAX_VERSION)]
    UnsupportedVersion(u64),

    /// Opcode needs a newer version than the one targeted
    #[error("{op} requires teal version {min}, targeting {version}")]
    VersionTooLow {
        op: &'static str,
        min: u64,
        version: u64,
    },

    /// Opcode not available in the requested mode
    #[error("{op} is not available in {mode} mode")]
    ModeMismatch { op: &'static str, mode: crate::Mode },

    #[error("type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        context: &'static str,
        expected: TealType,
        actual: TealType,
    },

    /// Top level neither returns nor leaves a uint64 on the stack
    #[error("program does not return a value")]
    MissingReturn,
}

/// Errors raised while evaluating a program against an invocation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("type mismatch in {context}: expected {expected}")]
    TypeMismatch {
        context: &'static str,
        expected: TealType,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    /// Global state keys must be valid UTF-8
    #[error("invalid global state key: 0x{0}")]
    InvalidKey(String),

    /// Program finished without a return value
    #[error("program finished without a return value")]
    NoReturn,
}

/// Crate-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("eval error: {0}")]
    Eval(#[from] EvalError),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed dry-run delta
    #[error("decode error: {0}")]
    Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
