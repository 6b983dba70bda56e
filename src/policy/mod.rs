//! Request policies.

pub mod backoff;
