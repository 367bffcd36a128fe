//! Product API
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /products | GET | List products |
//! | /products | POST | Create product (201) |
//! | /products/indexes | POST | Ensure indexes |
//! | /products/ratings/summary | GET | Ratings of every product |
//! | /products/{sku} | GET / PATCH / DELETE | Read, merge-update, delete (204) |
//! | /products/{sku}/rating | GET | Mean rating of one product |
//! | /products/{sku}/reviews | POST | Append review (201) |
//! | /products/{sku}/reviews/arrayfilters | PATCH | Patch every matching review |
//! | /products/{sku}/reviews/{review_id} | PATCH | Patch first review with that id |

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/products", get(handler::list).post(handler::create))
        .route("/products/indexes", post(handler::ensure_indexes))
        .route("/products/ratings/summary", get(handler::ratings_summary))
        .route(
            "/products/{sku}",
            get(handler::get_by_sku)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/products/{sku}/rating", get(handler::rating_for_sku))
        .route("/products/{sku}/reviews", post(handler::add_review))
        .route(
            "/products/{sku}/reviews/arrayfilters",
            patch(handler::update_reviews_by_filter),
        )
        .route(
            "/products/{sku}/reviews/{review_id}",
            patch(handler::update_review),
        )
}
