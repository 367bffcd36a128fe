//! Error conversion at the HTTP boundary
//!
//! Repository errors become [`AppError`]s carrying the sku and the failed
//! operation as details.

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

use crate::db::repository::{CatalogError, Missing};

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let op = err.op().as_str();
        let app = match &err {
            CatalogError::NotFound { sku, target, .. } => match target {
                Missing::Product => AppError::product_not_found(sku.as_str()),
                Missing::Review(criteria) => AppError::with_message(
                    ErrorCode::ReviewNotFound,
                    format!("Review matching {criteria} not found on product '{sku}'"),
                )
                .with_detail("sku", sku.as_str()),
                Missing::Reviews => AppError::with_message(
                    ErrorCode::ReviewNotFound,
                    format!("Product with SKU '{sku}' has no reviews"),
                )
                .with_detail("sku", sku.as_str()),
            },
            CatalogError::Conflict { sku, .. } => {
                AppError::conflict(format!("Product with SKU '{sku}' already exists"))
                    .with_detail("sku", sku.as_str())
            }
            CatalogError::Contended { sku, attempts, .. } => AppError::with_message(
                ErrorCode::ConcurrentModification,
                format!("Reviews of product '{sku}' are being modified concurrently, please retry"),
            )
            .with_detail("sku", sku.as_str())
            .with_detail("attempts", *attempts),
            CatalogError::StoreUnavailable { source, .. } => {
                tracing::error!(operation = op, error = %source, "Store operation failed");
                AppError::database_unavailable("Database unavailable")
            }
        };
        app.with_detail("operation", op)
    }
}
