//! Rating aggregates

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the catalog-wide ratings summary
///
/// Products without reviews are included with `review_count = 0` and no
/// average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub sku: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub review_count: u64,
    pub avg_rating: Option<f64>,
}

/// Average rating of a single product that has at least one review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRating {
    pub sku: String,
    pub name: String,
    pub avg_rating: f64,
    pub review_count: u64,
}

/// Arithmetic mean, `None` when there is nothing to average
pub fn mean_rating(total: f64, count: u64) -> Option<f64> {
    (count > 0).then(|| total / count as f64)
}
