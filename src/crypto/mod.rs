//! Keyed integrity primitives for the handshake and webhook callbacks.

pub mod digest;
pub mod random;
pub mod signing;
pub mod verify;
