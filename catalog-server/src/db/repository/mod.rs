//! Repository Module
//!
//! Data access for the product catalog on SurrealDB.

pub mod product;
pub mod review_patch;

pub use product::ProductRepository;
pub use review_patch::Cardinality;

use std::fmt;
use std::future::Future;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::error::Db as DbError;
use thiserror::Error;

/// Attempts for a single-statement write the store keeps aborting on conflict
pub const MAX_WRITE_ATTEMPTS: u32 = 32;

/// Catalog operation, carried by every [`CatalogError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Get,
    List,
    Update,
    Delete,
    AddReview,
    UpdateReviewByPosition,
    UpdateReviewsByFilter,
    RatingsSummary,
    RatingForSku,
    EnsureIndexes,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::List => "list",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::AddReview => "add_review",
            Self::UpdateReviewByPosition => "update_review_by_position",
            Self::UpdateReviewsByFilter => "update_reviews_by_filter",
            Self::RatingsSummary => "ratings_summary",
            Self::RatingForSku => "rating_for_sku",
            Self::EnsureIndexes => "ensure_indexes",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a `NotFound` was looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Product,
    /// No review matched the given criteria
    Review(String),
    /// Product exists but has no reviews
    Reviews,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => f.write_str("product"),
            Self::Review(criteria) => write!(f, "review matching {criteria} on product"),
            Self::Reviews => f.write_str("reviews for product"),
        }
    }
}

/// Catalog repository errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{op}: {target} '{sku}' not found")]
    NotFound {
        op: Operation,
        sku: String,
        target: Missing,
    },

    #[error("{op}: product '{sku}' already exists")]
    Conflict { op: Operation, sku: String },

    #[error("{op}: product '{sku}' kept changing, gave up after {attempts} attempts")]
    Contended {
        op: Operation,
        sku: String,
        attempts: u32,
    },

    #[error("{op}: store unavailable: {source}")]
    StoreUnavailable {
        op: Operation,
        #[source]
        source: surrealdb::Error,
    },
}

impl CatalogError {
    pub fn product_not_found(op: Operation, sku: &str) -> Self {
        Self::NotFound {
            op,
            sku: sku.to_string(),
            target: Missing::Product,
        }
    }

    pub fn op(&self) -> Operation {
        match self {
            Self::NotFound { op, .. }
            | Self::Conflict { op, .. }
            | Self::Contended { op, .. }
            | Self::StoreUnavailable { op, .. } => *op,
        }
    }

    pub fn sku(&self) -> Option<&str> {
        match self {
            Self::NotFound { sku, .. } | Self::Conflict { sku, .. } | Self::Contended { sku, .. } => {
                Some(sku)
            }
            Self::StoreUnavailable { .. } => None,
        }
    }
}

/// Result type for repository operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Tags store failures with the operation that hit them
pub(crate) trait StoreContext<T> {
    fn store(self, op: Operation) -> CatalogResult<T>;
}

impl<T> StoreContext<T> for Result<T, surrealdb::Error> {
    fn store(self, op: Operation) -> CatalogResult<T> {
        self.map_err(|source| CatalogError::StoreUnavailable { op, source })
    }
}

/// Record key or unique index already taken
pub(crate) fn is_duplicate(err: &surrealdb::Error) -> bool {
    matches!(
        err,
        surrealdb::Error::Db(
            DbError::RecordExists { .. } | DbError::IndexExists { .. } | DbError::TxKeyAlreadyExists
        )
    )
}

/// Optimistic transaction aborted by a concurrent writer; safe to replay
///
/// A conflict at commit time arrives wrapped in `QueryNotExecutedDetail`,
/// which only keeps the rendered message of the underlying error.
pub(crate) fn is_retryable(err: &surrealdb::Error) -> bool {
    match err {
        surrealdb::Error::Db(DbError::TxRetryable) => true,
        surrealdb::Error::Db(DbError::QueryNotExecutedDetail { message }) => {
            *message == DbError::TxRetryable.to_string()
        }
        _ => false,
    }
}

/// Pause before replaying a conflicted write
pub(crate) fn conflict_backoff(attempt: u32) -> Duration {
    Duration::from_millis(u64::from(attempt.min(10)))
}

/// Replay `write` while the store rejects it with a retryable conflict
///
/// Every other outcome is returned as is. Exhausting the attempts is
/// `Contended`, never `StoreUnavailable`.
pub(crate) async fn replay_on_conflict<T, F, Fut>(
    op: Operation,
    sku: &str,
    mut write: F,
) -> CatalogResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CatalogResult<T>>,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        match write().await {
            Err(CatalogError::StoreUnavailable { ref source, .. }) if is_retryable(source) => {
                tracing::debug!(%op, sku, attempt, "Write conflict, replaying");
                tokio::time::sleep(conflict_backoff(attempt)).await;
            }
            result => return result,
        }
    }

    Err(CatalogError::Contended {
        op,
        sku: sku.to_string(),
        attempts: MAX_WRITE_ATTEMPTS,
    })
}

// =============================================================================
// ID Convention: one record per product, keyed by sku
// =============================================================================
//
//   let id = RecordId::from_table_key("product", sku);
//
// The record key makes sku unique without a separate lookup. Record ids are
// never deserialized into the shared models, so they never reach callers.

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
