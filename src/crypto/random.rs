//! Random token generation.
//!
//! Two sources on purpose: [`secure_token`] draws from the operating system
//! CSPRNG and is the only one allowed for key material or anything secret.
//! [`filler_token`] uses the thread-local generator and is reserved for
//! non-secret filler.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Alphanumeric token of `length` characters from the OS CSPRNG.
pub fn secure_token(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Alphanumeric token of `length` characters for non-secret use.
pub fn filler_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
