//! Constant-time signature verification.

use crate::crypto::signing::{hmac_sha256_hex, parse_signature_header};
use subtle::ConstantTimeEq;

/// Compare two byte strings without an early exit on the first difference.
///
/// Length is not secret (signatures are always 64 hex characters), so
/// slices of different length compare unequal immediately.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Check a `sha256=<hex>` signature header against `payload`.
///
/// Malformed headers verify as `false`.
pub fn verify_signature(secret: &str, payload: &[u8], signature_header: &str) -> bool {
    let Some(provided) = parse_signature_header(signature_header) else {
        return false;
    };

    let expected = hmac_sha256_hex(secret.as_bytes(), payload);
    constant_time_eq(expected.as_bytes(), provided.as_bytes())
}
