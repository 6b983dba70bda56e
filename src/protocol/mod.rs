//! Wire contract with the licensing service.

pub mod models;
pub mod payload;
