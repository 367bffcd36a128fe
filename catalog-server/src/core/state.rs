use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::{Config, ServerResult};
use crate::db::DbService;
use crate::db::repository::ProductRepository;

/// Shared server state
///
/// Cloned into every handler. The store handle is opened once in
/// [`ServerState::initialize`] and shared by all repositories.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub db: Surreal<Db>,
    pub products: ProductRepository,
}

impl ServerState {
    /// Build state around an already opened store handle
    pub fn new(config: Config, db: Surreal<Db>) -> Self {
        Self {
            config: Arc::new(config),
            products: ProductRepository::new(db.clone()),
            db,
        }
    }

    /// Open the store, declare indexes and build the state
    pub async fn initialize(config: &Config) -> ServerResult<Self> {
        let service = DbService::new(config).await?;
        let state = Self::new(config.clone(), service.db);

        let indexes = state.products.ensure_indexes().await?;
        tracing::info!(count = indexes.len(), "Product indexes ensured");

        Ok(state)
    }
}
