//! Data models
//!
//! Shared between the catalog repositories and the HTTP API.

pub mod index;
pub mod product;
pub mod rating;
pub mod review;

pub use index::IndexInfo;
pub use product::{Product, ProductDeleted, ProductUpdate, validate_price};
pub use rating::{ProductRating, RatingSummary, mean_rating};
pub use review::{Review, ReviewArrayFilterUpdate, ReviewFilter, ReviewPatch};
