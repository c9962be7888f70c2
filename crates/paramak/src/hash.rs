//! Parameter fingerprints.
//!
//! A fingerprint is the SHA-256 of a canonical JSON rendering of a
//! parameter tree. Floats are rounded to 1e-9 first so that values which
//! differ only by accumulated round-off hash alike, and object keys are
//! sorted by `serde_json`'s default map.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

const PRECISION: f64 = 1e9;

/// Hex SHA-256 of the canonical form of `value`.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let tree = canonical(serde_json::to_value(value)?);
    let bytes = serde_json::to_vec(&tree)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Round every float in the tree.
fn canonical(value: Value) -> Value {
    match value {
        Value::Number(n) if !(n.is_i64() || n.is_u64()) => match n.as_f64() {
            Some(f) => {
                let rounded = (f * PRECISION).round() / PRECISION;
                // -0.0 and 0.0 must agree
                let rounded = if rounded == 0.0 { 0.0 } else { rounded };
                serde_json::Number::from_f64(rounded)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
            None => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, canonical(v))).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_off_is_ignored() {
        let a = fingerprint(&json!({"r": 0.1 + 0.2})).unwrap();
        let b = fingerprint(&json!({"r": 0.3})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_real_changes_are_seen() {
        let a = fingerprint(&json!({"r": 10.0})).unwrap();
        let b = fingerprint(&json!({"r": 10.001})).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_key_order_is_irrelevant() {
        let a = fingerprint(&json!({"a": 1, "b": [1.5, 2.5]})).unwrap();
        let b = fingerprint(&json!({"b": [1.5, 2.5], "a": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_signed_zero() {
        assert_eq!(
            fingerprint(&json!([-0.0])).unwrap(),
            fingerprint(&json!([0.0])).unwrap()
        );
    }
}
