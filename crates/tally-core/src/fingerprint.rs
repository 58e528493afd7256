use serde::Serialize;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a string's UTF-8 bytes.
pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Deterministic fingerprint of a case input: SHA-256 over its serde_json
/// serialization.
///
/// The hash covers the exact serialized text, so two values producing the
/// same JSON fingerprint identically regardless of their Rust types. Struct
/// fields serialize in declaration order and `serde_json::Value` objects
/// serialize with sorted keys, which makes the result stable across runs.
pub fn input_fingerprint<T: Serialize + ?Sized>(input: &T) -> serde_json::Result<String> {
    Ok(sha256_hex(&serde_json::to_string(input)?))
}
