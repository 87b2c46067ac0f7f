//! Request fingerprints.
//!
//! SHA-256 over a canonical JSON rendering of the normalized request. Object
//! keys are written in sorted order regardless of how `serde_json` was built,
//! so field order never changes the fingerprint.

use clinidraft_core::GenerationRequest;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 fingerprint of `request`.
///
/// Callers normalize first; two requests that differ only in case or
/// surrounding whitespace share a fingerprint only after normalization.
pub fn fingerprint(request: &GenerationRequest) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(request)?;
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical)?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(&map[key], out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}
