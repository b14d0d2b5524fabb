//! Lowering of [`Expr`] trees to TEAL assembly text
//!
//! Output layout:
//!   #pragma version N
//!   one instruction per line
//!   labels `main_lK:` where K is the index of the basic block they open
//!
//! A new basic block starts at every label and after every branch or
//! `return`. Labels are numbered after emission so that the listing reads
//! top to bottom.

use std::fmt;

use tracing::debug;

use crate::error::CompileError;
use crate::expr::{BinOp, Expr, GlobalField, TealType, TxnField};

/// Oldest version the assembler accepts
pub const MIN_VERSION: u64 = 1;
/// Newest version this compiler targets
pub const MAX_VERSION: u64 = 5;
/// First version with application programs, `return`, `b` and state opcodes
pub const APPLICATION_VERSION: u64 = 2;

/// Program mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stateful application (approval / clear-state) programs
    Application,
    /// Stateless logic signatures
    Signature,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Application => write!(f, "Application"),
            Mode::Signature => write!(f, "Signature"),
        }
    }
}

type LabelId = usize;

enum Line {
    Op(String),
    Branch(&'static str, LabelId),
    Label(LabelId),
}

/// Compile a program to TEAL text for the given mode and version
pub fn compile_teal(expr: &Expr, mode: Mode, version: u64) -> Result<String, CompileError> {
    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        return Err(CompileError::UnsupportedVersion(version));
    }
    if mode == Mode::Application && version < APPLICATION_VERSION {
        return Err(CompileError::VersionTooLow {
            op: "application mode",
            min: APPLICATION_VERSION,
            version,
        });
    }

    let mut compiler = Compiler {
        mode,
        version,
        lines: Vec::new(),
        labels: 0,
    };

    let ty = compiler.lower(expr)?;
    if !expr.terminates() {
        if ty != TealType::Uint64 {
            return Err(CompileError::MissingReturn);
        }
        // before `return` existed the top of the stack was the result
        if version >= APPLICATION_VERSION {
            compiler.op("return");
        }
    }

    let text = compiler.render();
    debug!(%mode, version, lines = text.lines().count(), "compiled program");
    Ok(text)
}

struct Compiler {
    mode: Mode,
    version: u64,
    lines: Vec<Line>,
    labels: usize,
}

impl Compiler {
    fn require(&self, op: &'static str, min: u64, app_only: bool) -> Result<(), CompileError> {
        if self.version < min {
            return Err(CompileError::VersionTooLow {
                op,
                min,
                version: self.version,
            });
        }
        if app_only && self.mode != Mode::Application {
            return Err(CompileError::ModeMismatch { op, mode: self.mode });
        }
        Ok(())
    }

    fn op(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Op(text.into()));
    }

    fn new_label(&mut self) -> LabelId {
        self.labels += 1;
        self.labels - 1
    }

    fn expect(context: &'static str, expected: TealType, actual: TealType) -> Result<(), CompileError> {
        if expected != actual {
            return Err(CompileError::TypeMismatch {
                context,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn lower(&mut self, expr: &Expr) -> Result<TealType, CompileError> {
        match expr {
            Expr::Int(n) => {
                self.op(format!("int {}", n));
                Ok(TealType::Uint64)
            }
            Expr::Bytes(b) => {
                self.op(format!("byte {}", byte_literal(b)));
                Ok(TealType::Bytes)
            }
            Expr::Txn(field) => {
                match field {
                    TxnField::ApplicationID => self.require("txn ApplicationID", APPLICATION_VERSION, true)?,
                    TxnField::Sender => {}
                }
                self.op(format!("txn {}", field.name()));
                Ok(field.teal_type())
            }
            Expr::Global(field) => {
                match field {
                    GlobalField::LatestTimestamp => {
                        self.require("global LatestTimestamp", APPLICATION_VERSION, true)?
                    }
                }
                self.op(format!("global {}", field.name()));
                Ok(TealType::Uint64)
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = self.lower(lhs)?;
                let r = self.lower(rhs)?;
                match op {
                    BinOp::Eq => {
                        if l == TealType::None {
                            return Err(CompileError::TypeMismatch {
                                context: "==",
                                expected: TealType::Uint64,
                                actual: l,
                            });
                        }
                        Self::expect("==", l, r)?;
                    }
                    BinOp::Add | BinOp::Div => {
                        Self::expect(op.opcode(), TealType::Uint64, l)?;
                        Self::expect(op.opcode(), TealType::Uint64, r)?;
                    }
                }
                self.op(op.opcode());
                Ok(TealType::Uint64)
            }
            Expr::GlobalPut(key, value) => {
                let k = self.lower(key)?;
                Self::expect("app_global_put key", TealType::Bytes, k)?;
                let v = self.lower(value)?;
                if v == TealType::None {
                    return Err(CompileError::TypeMismatch {
                        context: "app_global_put value",
                        expected: TealType::Uint64,
                        actual: v,
                    });
                }
                self.require("app_global_put", APPLICATION_VERSION, true)?;
                self.op("app_global_put");
                Ok(TealType::None)
            }
            Expr::Seq(items) => {
                let mut ty = TealType::None;
                for (i, item) in items.iter().enumerate() {
                    ty = self.lower(item)?;
                    if i + 1 < items.len() {
                        Self::expect("seq element", TealType::None, ty)?;
                    }
                }
                Ok(ty)
            }
            Expr::If(cond, then, otherwise) => self.lower_if(cond, then, otherwise),
            Expr::Return(value) => {
                let v = self.lower(value)?;
                Self::expect("return", TealType::Uint64, v)?;
                self.require("return", APPLICATION_VERSION, false)?;
                self.op("return");
                Ok(TealType::None)
            }
        }
    }

    fn lower_if(&mut self, cond: &Expr, then: &Expr, otherwise: &Expr) -> Result<TealType, CompileError> {
        let c = self.lower(cond)?;
        Self::expect("if condition", TealType::Uint64, c)?;

        let then_label = self.new_label();
        self.lines.push(Line::Branch("bnz", then_label));

        let else_ty = self.lower(otherwise)?;
        let end_label = if otherwise.terminates() {
            None
        } else {
            self.require("b", APPLICATION_VERSION, false)?;
            let label = self.new_label();
            self.lines.push(Line::Branch("b", label));
            Some(label)
        };

        self.lines.push(Line::Label(then_label));
        let then_ty = self.lower(then)?;

        if let Some(label) = end_label {
            self.lines.push(Line::Label(label));
        }

        match (then.terminates(), otherwise.terminates()) {
            (true, true) => Ok(TealType::None),
            (true, false) => Ok(else_ty),
            (false, true) => Ok(then_ty),
            (false, false) => {
                Self::expect("if branches", then_ty, else_ty)?;
                Ok(then_ty)
            }
        }
    }

    fn render(&self) -> String {
        // assign block indices to labels
        let mut block_of = vec![0usize; self.labels];
        let mut block = 0;
        let mut pending = false;
        for line in &self.lines {
            match line {
                Line::Label(id) => {
                    block += 1;
                    pending = false;
                    block_of[*id] = block;
                }
                Line::Op(text) => {
                    if pending {
                        block += 1;
                        pending = false;
                    }
                    if text == "return" {
                        pending = true;
                    }
                }
                Line::Branch(..) => {
                    if pending {
                        block += 1;
                    }
                    pending = true;
                }
            }
        }

        let mut out = vec![format!("#pragma version {}", self.version)];
        for line in &self.lines {
            match line {
                Line::Op(text) => out.push(text.clone()),
                Line::Branch(op, id) => out.push(format!("{} main_l{}", op, block_of[*id])),
                Line::Label(id) => out.push(format!("main_l{}:", block_of[*id])),
            }
        }
        out.join("\n")
    }
}

/// Quoted string when printable ASCII, hex otherwise
fn byte_literal(bytes: &[u8]) -> String {
    if bytes.iter().all(|b| (0x20..0x7f).contains(b)) {
        let mut s = String::with_capacity(bytes.len() + 2);
        s.push('"');
        for &b in bytes {
            match b {
                b'"' => s.push_str("\\\""),
                b'\\' => s.push_str("\\\\"),
                _ => s.push(b as char),
            }
        }
        s.push('"');
        s
    } else {
        format!("0x{}", hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::dsl::*;

    #[test]
    fn test_approve_only() {
        let teal = compile_teal(&approve(), Mode::Application, 5).unwrap();
        assert_eq!(teal, "#pragma version 5\nint 1\nreturn");
    }

    #[test]
    fn test_implicit_return() {
        let teal = compile_teal(&int(1), Mode::Application, 3).unwrap();
        assert_eq!(teal, "#pragma version 3\nint 1\nreturn");
    }

    #[test]
    fn test_if_with_fallthrough_else() {
        let program = if_(eq(txn_application_id(), int(0)), int(1), int(2));
        let teal = compile_teal(&program, Mode::Application, 5).unwrap();
        let expected = [
            "#pragma version 5",
            "txn ApplicationID",
            "int 0",
            "==",
            "bnz main_l2",
            "int 2",
            "b main_l3",
            "main_l2:",
            "int 1",
            "main_l3:",
            "return",
        ]
        .join("\n");
        assert_eq!(teal, expected);
    }

    #[test]
    fn test_unsupported_version() {
        assert_eq!(
            compile_teal(&approve(), Mode::Application, 0),
            Err(CompileError::UnsupportedVersion(0))
        );
        assert_eq!(
            compile_teal(&approve(), Mode::Application, 6),
            Err(CompileError::UnsupportedVersion(6))
        );
    }

    #[test]
    fn test_version_too_low() {
        assert_eq!(
            compile_teal(&approve(), Mode::Application, 1),
            Err(CompileError::VersionTooLow {
                op: "application mode",
                min: 2,
                version: 1
            })
        );
        assert_eq!(
            compile_teal(&approve(), Mode::Signature, 1),
            Err(CompileError::VersionTooLow {
                op: "return",
                min: 2,
                version: 1
            })
        );
        let program = if_(eq(txn_sender(), bytes("A")), int(1), int(0));
        assert_eq!(
            compile_teal(&program, Mode::Signature, 1),
            Err(CompileError::VersionTooLow {
                op: "b",
                min: 2,
                version: 1
            })
        );
    }

    #[test]
    fn test_version_one_leaves_result_on_stack() {
        let teal = compile_teal(&eq(txn_sender(), bytes("A")), Mode::Signature, 1).unwrap();
        assert_eq!(teal, "#pragma version 1\ntxn Sender\nbyte \"A\"\n==");
    }

    #[test]
    fn test_signature_mode_rejects_state_access() {
        let program = seq([global_put(bytes("k"), int(1)), approve()]);
        assert_eq!(
            compile_teal(&program, Mode::Signature, 5),
            Err(CompileError::ModeMismatch {
                op: "app_global_put",
                mode: Mode::Signature
            })
        );
        // plain approval is fine in either mode
        assert!(compile_teal(&approve(), Mode::Signature, 5).is_ok());
    }

    #[test]
    fn test_type_errors() {
        let bad_add = add(int(1), bytes("x"));
        assert!(matches!(
            compile_teal(&bad_add, Mode::Application, 5),
            Err(CompileError::TypeMismatch { context: "+", .. })
        ));

        let bad_key = seq([global_put(int(1), int(1)), approve()]);
        assert!(matches!(
            compile_teal(&bad_key, Mode::Application, 5),
            Err(CompileError::TypeMismatch {
                context: "app_global_put key",
                ..
            })
        ));

        let bad_seq = seq([int(1), approve()]);
        assert!(matches!(
            compile_teal(&bad_seq, Mode::Application, 5),
            Err(CompileError::TypeMismatch {
                context: "seq element",
                ..
            })
        ));

        let bad_return = ret(bytes("x"));
        assert!(matches!(
            compile_teal(&bad_return, Mode::Application, 5),
            Err(CompileError::TypeMismatch { context: "return", .. })
        ));
    }

    #[test]
    fn test_missing_return() {
        assert_eq!(
            compile_teal(&bytes("x"), Mode::Application, 5),
            Err(CompileError::MissingReturn)
        );
        assert_eq!(
            compile_teal(&global_put(bytes("k"), int(1)), Mode::Application, 5),
            Err(CompileError::MissingReturn)
        );
    }

    #[test]
    fn test_byte_literals() {
        assert_eq!(byte_literal(b"Hello World!"), "\"Hello World!\"");
        assert_eq!(byte_literal(b"a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(byte_literal(&[0x00, 0xff]), "0x00ff");
    }
}
