//! Global state schema of a program
//!
//! Application creation has to declare how many uint and byte-slice slots
//! the program may use in global state. The counts are read off the
//! program: every `app_global_put` with a constant key claims one slot of its
//! value's type.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::expr::{Expr, TealType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

/// Slots claimed by `program`; writes under non-constant keys are skipped
pub fn global_schema(program: &Expr) -> StateSchema {
    let mut slots = BTreeMap::new();
    collect(program, &mut slots);

    let mut schema = StateSchema::default();
    for ty in slots.values() {
        match ty {
            TealType::Uint64 => schema.num_uints += 1,
            TealType::Bytes => schema.num_byte_slices += 1,
            TealType::None => {}
        }
    }
    schema
}

fn collect(expr: &Expr, slots: &mut BTreeMap<Vec<u8>, TealType>) {
    match expr {
        Expr::GlobalPut(key, value) => {
            if let Expr::Bytes(k) = key.as_ref() {
                slots.insert(k.clone(), value.teal_type());
            }
            collect(value, slots);
        }
        Expr::Binary(_, lhs, rhs) => {
            collect(lhs, slots);
            collect(rhs, slots);
        }
        Expr::Seq(items) => items.iter().for_each(|e| collect(e, slots)),
        Expr::If(cond, then, otherwise) => {
            collect(cond, slots);
            collect(then, slots);
            collect(otherwise, slots);
        }
        Expr::Return(value) => collect(value, slots),
        Expr::Int(_) | Expr::Bytes(_) | Expr::Txn(_) | Expr::Global(_) => {}
    }
}
