//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;

use crate::core::ServerState;
use crate::utils::{AppResult, validate_payload};
use shared::models::{
    IndexInfo, Product, ProductRating, ProductUpdate, RatingSummary, Review,
    ReviewArrayFilterUpdate, ReviewPatch,
};

/// GET /products - list all products
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let products = state.products.list().await?;
    Ok(Json(products))
}

/// GET /products/{sku} - get one product
pub async fn get_by_sku(
    State(state): State<ServerState>,
    Path(sku): Path<String>,
) -> AppResult<Json<Product>> {
    let product = state.products.get(&sku).await?;
    Ok(Json(product))
}

/// POST /products - create a product
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<Product>,
) -> AppResult<(StatusCode, Json<Product>)> {
    validate_payload(&payload)?;
    let product = state.products.create(payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /products/{sku} - merge top-level fields
pub async fn update(
    State(state): State<ServerState>,
    Path(sku): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    validate_payload(&payload)?;
    let product = state.products.update(&sku, payload).await?;
    Ok(Json(product))
}

/// DELETE /products/{sku} - delete a product
pub async fn delete(
    State(state): State<ServerState>,
    Path(sku): Path<String>,
) -> AppResult<StatusCode> {
    let deleted = state.products.delete(&sku).await?;
    tracing::debug!(sku = %deleted.sku, "{}", deleted.message);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /products/{sku}/reviews - append a review
pub async fn add_review(
    State(state): State<ServerState>,
    Path(sku): Path<String>,
    Json(payload): Json<Review>,
) -> AppResult<(StatusCode, Json<Product>)> {
    validate_payload(&payload)?;
    let product = state.products.add_review(&sku, payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /products/{sku}/reviews/{review_id} - patch the first review with that id
pub async fn update_review(
    State(state): State<ServerState>,
    Path((sku, review_id)): Path<(String, String)>,
    Json(payload): Json<ReviewPatch>,
) -> AppResult<Json<Product>> {
    validate_payload(&payload)?;
    let product = state
        .products
        .update_review_by_position(&sku, &review_id, payload)
        .await?;
    Ok(Json(product))
}

/// PATCH /products/{sku}/reviews/arrayfilters - patch every matching review
pub async fn update_reviews_by_filter(
    State(state): State<ServerState>,
    Path(sku): Path<String>,
    Json(payload): Json<ReviewArrayFilterUpdate>,
) -> AppResult<Json<Product>> {
    validate_payload(&payload)?;
    let product = state
        .products
        .update_reviews_by_filter(&sku, payload.filter_criteria, payload.new_data)
        .await?;
    Ok(Json(product))
}

/// GET /products/ratings/summary - review count and mean rating per product
pub async fn ratings_summary(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<RatingSummary>>> {
    let summary = state.products.ratings_summary().await?;
    Ok(Json(summary))
}

/// GET /products/{sku}/rating - mean rating of one product
pub async fn rating_for_sku(
    State(state): State<ServerState>,
    Path(sku): Path<String>,
) -> AppResult<Json<ProductRating>> {
    let rating = state.products.rating_for_sku(&sku).await?;
    Ok(Json(rating))
}

/// POST /products/indexes - declare indexes and list them
pub async fn ensure_indexes(State(state): State<ServerState>) -> AppResult<Json<Vec<IndexInfo>>> {
    let indexes = state.products.ensure_indexes().await?;
    Ok(Json(indexes))
}
