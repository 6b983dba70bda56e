//! Transport to the licensing service.

pub mod gateway;
pub mod http;
