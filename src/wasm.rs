//! WASM bindings for the hello-world contract

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::compile::{compile_teal, Mode};
use crate::contract;
use crate::delta::{self, DeltaEntry};
use crate::eval::{Decision, Invocation, Outcome};
use crate::schema;

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, String> {
    serde_wasm_bindgen::to_value(value).map_err(|e| format!("serialization error: {}", e))
}

/// Compile the approval program
#[wasm_bindgen]
pub fn approval_teal(version: u64) -> Result<String, String> {
    compile_teal(&contract::approval(), Mode::Application, version).map_err(|e| e.to_string())
}

/// Compile the clear-state program
#[wasm_bindgen]
pub fn clear_teal(version: u64) -> Result<String, String> {
    compile_teal(&contract::clear(), Mode::Application, version).map_err(|e| e.to_string())
}

/// Global schema to declare at creation, `{num_uints, num_byte_slices}`
#[wasm_bindgen]
pub fn approval_schema() -> Result<JsValue, String> {
    to_js(&schema::global_schema(&contract::approval()))
}

#[derive(Serialize)]
struct DryRun {
    decision: Decision,
    #[serde(rename = "global-delta")]
    global_delta: Vec<DeltaEntry>,
}

impl From<Outcome> for DryRun {
    fn from(outcome: Outcome) -> Self {
        Self {
            decision: outcome.decision,
            global_delta: delta::to_delta(&outcome.global_state),
        }
    }
}

/// Dry-run the approval program for one call
#[wasm_bindgen]
pub fn dryrun_approval(application_id: u64, sender: &str, latest_timestamp: u64) -> Result<JsValue, String> {
    let invocation = Invocation::new(application_id, sender, latest_timestamp);
    let outcome = contract::evaluate_approval(&invocation).map_err(|e| e.to_string())?;
    to_js(&DryRun::from(outcome))
}

/// Dry-run the clear-state program for one call
#[wasm_bindgen]
pub fn dryrun_clear(application_id: u64, sender: &str, latest_timestamp: u64) -> Result<JsValue, String> {
    let invocation = Invocation::new(application_id, sender, latest_timestamp);
    let outcome = contract::evaluate_clear(&invocation).map_err(|e| e.to_string())?;
    to_js(&DryRun::from(outcome))
}

/// Decode a `global-delta` JSON array into `{key: value}`
#[wasm_bindgen]
pub fn readable_global_delta(delta_json: &str) -> Result<JsValue, String> {
    let entries: Vec<DeltaEntry> =
        serde_json::from_str(delta_json).map_err(|e| format!("invalid delta json: {}", e))?;
    let decoded = delta::readable(&entries).map_err(|e| e.to_string())?;
    to_js(&decoded)
}
