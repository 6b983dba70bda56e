//! HMAC-SHA256 webhook signatures.
//!
//! Header format: `sha256=<lower-case hex HMAC-SHA256(secret, payload)>`.
//! A bare hex digest (no prefix) is accepted on input as well.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

const HEX_LEN: usize = 64;

/// HMAC-SHA256 of `payload` keyed with `secret`, as lower-case hex.
pub fn hmac_sha256_hex(secret: &[u8], payload: &[u8]) -> String {
    // HMAC takes keys of any length; new_from_slice cannot fail here.
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Compute the signature header value for a webhook payload.
pub fn webhook_signature(secret: &str, payload: &[u8]) -> String {
    format_signature_header(&hmac_sha256_hex(secret.as_bytes(), payload))
}

/// Prefix a hex digest with `sha256=`.
pub fn format_signature_header(hex_digest: &str) -> String {
    format!("{}{}", SIGNATURE_PREFIX, hex_digest)
}

/// Extract the hex digest from a signature header, normalized to lower case.
///
/// Returns `None` unless the value (after an optional `sha256=` prefix) is
/// exactly 64 hex characters.
pub fn parse_signature_header(header: &str) -> Option<String> {
    let header = header.trim();
    let digest = header.strip_prefix(SIGNATURE_PREFIX).unwrap_or(header);

    if digest.len() != HEX_LEN || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    Some(digest.to_ascii_lowercase())
}
