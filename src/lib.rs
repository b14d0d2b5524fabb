//! Hello-world application contract for the TEAL VM
//!
//! This crate provides:
//! - A small expression language for TEAL programs
//! - A compiler from expressions to TEAL assembly text
//! - An evaluator that dry-runs a program against one invocation
//! - The contract itself and the step that writes `approval.teal` / `clear.teal`
//! - WASM bindings for web usage

pub mod compile;
pub mod contract;
pub mod delta;
pub mod emit;
pub mod error;
pub mod eval;
pub mod expr;
pub mod schema;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use compile::{compile_teal, Mode};
pub use delta::{readable, to_delta, DeltaEntry};
pub use emit::{emit, Artifacts, EmitConfig, EmitReport, TEAL_VERSION};
pub use error::{CompileError, Error, EvalError, Result};
pub use eval::{evaluate, Decision, GlobalState, Invocation, Outcome, TealValue};
pub use expr::{Expr, TealType};
pub use schema::{global_schema, StateSchema};
