//! Shared types for the product catalog
//!
//! Models exchanged between the HTTP layer and the data-access engine,
//! plus the unified error and response types.

pub mod error;
pub mod models;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
