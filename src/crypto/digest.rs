//! SHA-256 digests.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data` as lower-case hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compute the handshake credential hash.
///
/// SHA-256 over `app_name ++ owner_id ++ app_secret`, lower-case hex. Proves
/// possession of the secret without sending it. Deterministic: there is no
/// nonce or timestamp, so an intercepted hash can be replayed. The service
/// expects exactly this value, so the gap is left as is.
pub fn credential_hash(app_name: &str, owner_id: &str, app_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(app_name.as_bytes());
    hasher.update(owner_id.as_bytes());
    hasher.update(app_secret.as_bytes());
    hex::encode(hasher.finalize())
}
