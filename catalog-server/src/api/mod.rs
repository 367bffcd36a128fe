//! HTTP API modules

pub mod health;
pub mod products;
