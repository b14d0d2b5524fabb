//! Global-state deltas in the node's dry-run shape
//!
//! ```json
//! [{"key": "WWVhcg==", "value": {"action": 2, "uint": 2024}}]
//! ```
//!
//! Keys and byte values are base64. `action` is 1 for a bytes write, 2 for a
//! uint write and 3 for a delete.
//!
//! When decoded, a 32-byte value is a public key and is shown as an account
//! address: base32 of the key followed by the last 4 bytes of its
//! SHA-512/256 digest, without padding.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

use crate::error::{Error, Result};
use crate::eval::{GlobalState, TealValue};

pub const ACTION_SET_BYTES: u8 = 1;
pub const ACTION_SET_UINT: u8 = 2;
pub const ACTION_DELETE: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaValue {
    pub action: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uint: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEntry {
    pub key: String,
    pub value: DeltaValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Readable {
    Uint(u64),
    Text(String),
}

/// Render state writes as delta entries, ordered by key
pub fn to_delta(state: &GlobalState) -> Vec<DeltaEntry> {
    state
        .iter()
        .map(|(key, value)| DeltaEntry {
            key: STANDARD.encode(key),
            value: match value {
                TealValue::Uint(n) => DeltaValue {
                    action: ACTION_SET_UINT,
                    bytes: None,
                    uint: Some(*n),
                },
                TealValue::Bytes(b) => DeltaValue {
                    action: ACTION_SET_BYTES,
                    bytes: Some(STANDARD.encode(b)),
                    uint: None,
                },
            },
        })
        .collect()
}

/// Public key length of an account address
pub const PUBLIC_KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;

/// Account address for a 32-byte public key
pub fn encode_address(public_key: &[u8; PUBLIC_KEY_LEN]) -> String {
    let digest = Sha512_256::digest(public_key);
    let mut buf = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
    buf.extend_from_slice(public_key);
    buf.extend_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    BASE32_NOPAD.encode(&buf)
}

fn readable_bytes(raw: Vec<u8>) -> Readable {
    if let Ok(public_key) = <[u8; PUBLIC_KEY_LEN]>::try_from(raw.as_slice()) {
        return Readable::Text(encode_address(&public_key));
    }
    match String::from_utf8(raw) {
        Ok(text) => Readable::Text(text),
        Err(e) => Readable::Text(format!("0x{}", hex::encode(e.as_bytes()))),
    }
}

fn decode(field: &str, data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data)
        .map_err(|e| Error::Decode(format!("invalid base64 in {}: {}", field, e)))
}

/// Decode delta entries into key -> value.
///
/// 32-byte values are shown as addresses, other bytes as text when UTF-8 and
/// `0x` hex otherwise. Deletes decode to `None` (`null` in JSON).
pub fn readable(delta: &[DeltaEntry]) -> Result<BTreeMap<String, Option<Readable>>> {
    let mut out = BTreeMap::new();
    for entry in delta {
        let key = String::from_utf8(decode("key", &entry.key)?)
            .map_err(|e| Error::Decode(format!("key is not utf-8: {}", e)))?;

        let value = match entry.value.action {
            ACTION_SET_BYTES => {
                let data = entry
                    .value
                    .bytes
                    .as_deref()
                    .ok_or_else(|| Error::Decode(format!("{}: bytes action without bytes", key)))?;
                Some(readable_bytes(decode("bytes", data)?))
            }
            ACTION_SET_UINT => Some(Readable::Uint(entry.value.uint.unwrap_or(0))),
            ACTION_DELETE => None,
            other => return Err(Error::Decode(format!("{}: unknown action {}", key, other))),
        };
        out.insert(key, value);
    }
    Ok(out)
}
