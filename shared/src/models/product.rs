//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use super::review::Review;

/// Upper bound for prices (10 digits, 2 of them fractional)
const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Product document
///
/// `sku` is the lookup key for every operation and never changes after
/// creation. The price travels as a JSON/store float and is rebuilt into a
/// `Decimal` from its shortest decimal representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Product {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: Option<String>,
    /// Insertion order is display order
    #[serde(default)]
    #[validate(nested)]
    pub reviews: Vec<Review>,
}

/// Update product payload (merge patch over top-level fields)
///
/// Only the fields present in the request are serialized, so the store
/// merge leaves everything else untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "float_price")]
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub category: Option<String>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.category.is_none()
    }
}

/// `Option<Decimal>` on the same float path as [`Product::price`]
mod float_price {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    struct Float(#[serde(with = "rust_decimal::serde::float")] Decimal);

    pub fn serialize<S: Serializer>(price: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
        match price {
            Some(price) => rust_decimal::serde::float::serialize(price, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
        Ok(Option::<Float>::deserialize(d)?.map(|Float(price)| price))
    }
}

/// Confirmation returned by a delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDeleted {
    pub sku: String,
    pub message: String,
}

impl ProductDeleted {
    pub fn new(sku: impl Into<String>) -> Self {
        let sku = sku.into();
        Self {
            message: format!("Product '{sku}' deleted successfully"),
            sku,
        }
    }
}

/// Prices are non-negative, carry at most two fractional digits and at most
/// ten digits overall.
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("price_negative")
            .with_message(Cow::Borrowed("price must not be negative")));
    }
    if price.normalize().scale() > 2 {
        return Err(ValidationError::new("price_scale")
            .with_message(Cow::Borrowed("price must have at most two decimal places")));
    }
    if *price > MAX_PRICE {
        return Err(ValidationError::new("price_range")
            .with_message(Cow::Borrowed("price must have at most 10 digits")));
    }
    Ok(())
}
