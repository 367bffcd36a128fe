//! Product Repository

use super::review_patch::{self, Cardinality};
use super::{
    BaseRepository, CatalogError, CatalogResult, Missing, Operation, StoreContext,
    conflict_backoff, is_duplicate, is_retryable, replay_on_conflict,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::{
    IndexInfo, Product, ProductDeleted, ProductRating, ProductUpdate, RatingSummary, Review,
    ReviewFilter, ReviewPatch, mean_rating,
};
use std::collections::BTreeMap;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const PRODUCT_TABLE: &str = "product";

/// Read-plan-write rounds before a review patch gives up
pub const MAX_PATCH_ATTEMPTS: u32 = 5;

const ENSURE_INDEXES: &str = "
    DEFINE INDEX IF NOT EXISTS idx_sku_unique ON TABLE product FIELDS sku UNIQUE;
    DEFINE INDEX IF NOT EXISTS idx_reviews_review_id ON TABLE product FIELDS reviews.*.review_id;
    DEFINE INDEX IF NOT EXISTS idx_price ON TABLE product FIELDS price;
    INFO FOR TABLE product;
";

const RATING_PROJECTION: &str = "sku, name, price, \
    array::len(reviews ?? []) AS review_count, \
    math::sum(reviews.rating ?? []) AS rating_total";

fn product_id(sku: &str) -> RecordId {
    RecordId::from_table_key(PRODUCT_TABLE, sku)
}

/// Product document as stored, including the review revision counter
#[derive(Debug, Deserialize)]
struct StoredProduct {
    sku: String,
    name: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    reviews: Option<Vec<Review>>,
    #[serde(default)]
    reviews_version: Option<u64>,
}

impl StoredProduct {
    fn into_parts(self) -> (Product, u64) {
        let product = Product {
            sku: self.sku,
            name: self.name,
            price: self.price,
            category: self.category,
            reviews: self.reviews.unwrap_or_default(),
        };
        (product, self.reviews_version.unwrap_or(0))
    }
}

#[derive(Debug, Deserialize)]
struct RatingRow {
    sku: String,
    name: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    review_count: u64,
    rating_total: f64,
}

#[derive(Debug, Default, Deserialize)]
struct TableInfo {
    #[serde(default)]
    indexes: BTreeMap<String, String>,
}

// =============================================================================
// Product Repository
// =============================================================================

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    async fn find(&self, op: Operation, sku: &str) -> CatalogResult<Option<Product>> {
        let product: Option<Product> = self
            .base
            .db()
            .select((PRODUCT_TABLE, sku))
            .await
            .store(op)?;
        Ok(product)
    }

    async fn load(&self, op: Operation, sku: &str) -> CatalogResult<Option<StoredProduct>> {
        let stored: Vec<StoredProduct> = self
            .base
            .db()
            .query("SELECT * FROM $product")
            .bind(("product", product_id(sku)))
            .await
            .store(op)?
            .take(0)
            .store(op)?;
        Ok(stored.into_iter().next())
    }

    /// Insert a new product
    ///
    /// The lookup beforehand only short-circuits the common case. The record
    /// key and the unique sku index reject a concurrent duplicate on insert.
    /// An insert aborted by a concurrent writer is replayed from the lookup.
    pub async fn create(&self, product: Product) -> CatalogResult<Product> {
        let op = Operation::Create;
        let sku = product.sku.clone();

        let created = replay_on_conflict(op, &sku, || self.insert(op, product.clone())).await?;
        tracing::info!(sku = %sku, "Product created");
        Ok(created)
    }

    async fn insert(&self, op: Operation, product: Product) -> CatalogResult<Product> {
        let sku = product.sku.clone();
        let conflict = || CatalogError::Conflict {
            op,
            sku: sku.clone(),
        };

        if self.find(op, &sku).await?.is_some() {
            return Err(conflict());
        }

        let created: surrealdb::Result<Vec<Product>> = match self
            .base
            .db()
            .query("CREATE $product CONTENT $data")
            .bind(("product", product_id(&sku)))
            .bind(("data", product))
            .await
        {
            Ok(mut response) => response.take(0),
            Err(e) => Err(e),
        };

        match created {
            Ok(created) => created
                .into_iter()
                .next()
                .ok_or_else(|| CatalogError::product_not_found(op, &sku)),
            Err(e) if is_duplicate(&e) => Err(conflict()),
            Err(source) => Err(CatalogError::StoreUnavailable { op, source }),
        }
    }

    /// Find product by sku
    pub async fn get(&self, sku: &str) -> CatalogResult<Product> {
        let op = Operation::Get;
        self.find(op, sku)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(op, sku))
    }

    /// All products in store order
    pub async fn list(&self) -> CatalogResult<Vec<Product>> {
        let op = Operation::List;
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product")
            .await
            .store(op)?
            .take(0)
            .store(op)?;
        Ok(products)
    }

    /// Merge the supplied top-level fields; an empty update is a read
    pub async fn update(&self, sku: &str, changes: ProductUpdate) -> CatalogResult<Product> {
        let op = Operation::Update;
        if changes.is_empty() {
            return self
                .find(op, sku)
                .await?
                .ok_or_else(|| CatalogError::product_not_found(op, sku));
        }

        let updated: Vec<Product> = replay_on_conflict(op, sku, || async {
            self.base
                .db()
                .query("UPDATE $product MERGE $data RETURN AFTER")
                .bind(("product", product_id(sku)))
                .bind(("data", changes.clone()))
                .await
                .store(op)?
                .take(0)
                .store(op)
        })
        .await?;

        let product = updated
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::product_not_found(op, sku))?;
        tracing::debug!(sku = %sku, "Product updated");
        Ok(product)
    }

    /// Hard delete a product
    pub async fn delete(&self, sku: &str) -> CatalogResult<ProductDeleted> {
        let op = Operation::Delete;
        let deleted: Vec<Product> = replay_on_conflict(op, sku, || async {
            self.base
                .db()
                .query("DELETE $product RETURN BEFORE")
                .bind(("product", product_id(sku)))
                .await
                .store(op)?
                .take(0)
                .store(op)
        })
        .await?;

        if deleted.is_empty() {
            return Err(CatalogError::product_not_found(op, sku));
        }
        tracing::info!(sku = %sku, "Product deleted");
        Ok(ProductDeleted::new(sku))
    }

    /// Append a review, keeping insertion order
    pub async fn add_review(&self, sku: &str, review: Review) -> CatalogResult<Product> {
        let op = Operation::AddReview;
        let updated: Vec<Product> = replay_on_conflict(op, sku, || async {
            self.base
                .db()
                .query(
                    "UPDATE $product SET \
                        reviews = array::append(reviews ?? [], $review), \
                        reviews_version = (reviews_version ?? 0) + 1 \
                     RETURN AFTER",
                )
                .bind(("product", product_id(sku)))
                .bind(("review", review.clone()))
                .await
                .store(op)?
                .take(0)
                .store(op)
        })
        .await?;

        let product = updated
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::product_not_found(op, sku))?;
        tracing::debug!(sku = %sku, reviews = product.reviews.len(), "Review added");
        Ok(product)
    }

    /// Patch the first review whose `review_id` matches
    pub async fn update_review_by_position(
        &self,
        sku: &str,
        review_id: &str,
        patch: ReviewPatch,
    ) -> CatalogResult<Product> {
        self.patch_reviews(
            Operation::UpdateReviewByPosition,
            sku,
            &ReviewFilter::by_review_id(review_id),
            &patch,
            Cardinality::First,
        )
        .await
    }

    /// Patch every review matching all of `filter`
    pub async fn update_reviews_by_filter(
        &self,
        sku: &str,
        filter: ReviewFilter,
        patch: ReviewPatch,
    ) -> CatalogResult<Product> {
        self.patch_reviews(
            Operation::UpdateReviewsByFilter,
            sku,
            &filter,
            &patch,
            Cardinality::All,
        )
        .await
    }

    /// Read the reviews, patch them in memory, write back if nobody else did
    async fn patch_reviews(
        &self,
        op: Operation,
        sku: &str,
        filter: &ReviewFilter,
        patch: &ReviewPatch,
        cardinality: Cardinality,
    ) -> CatalogResult<Product> {
        for attempt in 1..=MAX_PATCH_ATTEMPTS {
            let (mut product, version) = self
                .load(op, sku)
                .await?
                .ok_or_else(|| CatalogError::product_not_found(op, sku))?
                .into_parts();

            let matched = review_patch::apply(&mut product.reviews, filter, patch, cardinality);
            if matched == 0 {
                return match cardinality {
                    Cardinality::First => Err(CatalogError::NotFound {
                        op,
                        sku: sku.to_string(),
                        target: Missing::Review(filter.to_string()),
                    }),
                    Cardinality::All => Ok(product),
                };
            }
            if patch.is_empty() {
                return Ok(product);
            }

            if let Some(updated) = self
                .write_reviews(op, sku, product.reviews, version)
                .await?
            {
                tracing::debug!(sku = %sku, matched, attempt, "Reviews patched");
                return Ok(updated);
            }
            tracing::debug!(sku = %sku, attempt, "Review revision moved, replanning");
            tokio::time::sleep(conflict_backoff(attempt)).await;
        }

        Err(CatalogError::Contended {
            op,
            sku: sku.to_string(),
            attempts: MAX_PATCH_ATTEMPTS,
        })
    }

    /// Compare-and-set on the review revision; `None` when it moved
    async fn write_reviews(
        &self,
        op: Operation,
        sku: &str,
        reviews: Vec<Review>,
        expected: u64,
    ) -> CatalogResult<Option<Product>> {
        let written: surrealdb::Result<Vec<Product>> = match self
            .base
            .db()
            .query(
                "UPDATE $product SET reviews = $reviews, reviews_version = $next \
                 WHERE (reviews_version ?? 0) = $expected \
                 RETURN AFTER",
            )
            .bind(("product", product_id(sku)))
            .bind(("reviews", reviews))
            .bind(("expected", expected))
            .bind(("next", expected + 1))
            .await
        {
            Ok(mut response) => response.take(0),
            Err(e) => Err(e),
        };

        match written {
            Ok(updated) => Ok(updated.into_iter().next()),
            Err(e) if is_retryable(&e) => Ok(None),
            Err(source) => Err(CatalogError::StoreUnavailable { op, source }),
        }
    }

    /// Review count and mean rating for every product
    pub async fn ratings_summary(&self) -> CatalogResult<Vec<RatingSummary>> {
        let op = Operation::RatingsSummary;
        let rows: Vec<RatingRow> = self
            .base
            .db()
            .query(format!("SELECT {RATING_PROJECTION} FROM product"))
            .await
            .store(op)?
            .take(0)
            .store(op)?;

        Ok(rows
            .into_iter()
            .map(|row| RatingSummary {
                avg_rating: mean_rating(row.rating_total, row.review_count),
                sku: row.sku,
                name: row.name,
                price: row.price,
                review_count: row.review_count,
            })
            .collect())
    }

    /// Mean rating of one product; a product without reviews is not found
    pub async fn rating_for_sku(&self, sku: &str) -> CatalogResult<ProductRating> {
        let op = Operation::RatingForSku;
        let rows: Vec<RatingRow> = self
            .base
            .db()
            .query(format!("SELECT {RATING_PROJECTION} FROM $product"))
            .bind(("product", product_id(sku)))
            .await
            .store(op)?
            .take(0)
            .store(op)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::product_not_found(op, sku))?;
        let avg_rating =
            mean_rating(row.rating_total, row.review_count).ok_or_else(|| CatalogError::NotFound {
                op,
                sku: sku.to_string(),
                target: Missing::Reviews,
            })?;

        Ok(ProductRating {
            sku: row.sku,
            name: row.name,
            avg_rating,
            review_count: row.review_count,
        })
    }

    /// Declare the product indexes (idempotent) and list what is defined
    pub async fn ensure_indexes(&self) -> CatalogResult<Vec<IndexInfo>> {
        let op = Operation::EnsureIndexes;
        let info: Option<TableInfo> = self
            .base
            .db()
            .query(ENSURE_INDEXES)
            .await
            .store(op)?
            .check()
            .store(op)?
            .take(3)
            .store(op)?;

        let indexes: Vec<IndexInfo> = info
            .unwrap_or_default()
            .indexes
            .into_iter()
            .map(|(name, definition)| IndexInfo { name, definition })
            .collect();
        tracing::debug!(count = indexes.len(), "Product indexes ensured");
        Ok(indexes)
    }
}
