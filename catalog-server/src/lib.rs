//! Catalog Server
//!
//! Product catalog over an embedded SurrealDB store: product CRUD, embedded
//! reviews with positional and filter updates, and rating aggregates.
//!
//! - [`core`] configuration, state and the serve loop
//! - [`db`] store handle and the product repository
//! - [`api`] axum handlers, assembled in [`routes`]

pub mod api;
pub mod core;
pub mod db;
pub mod middleware;
pub mod routes;
pub mod utils;

pub use crate::core::{Config, Server, ServerError, ServerState};
pub use db::repository::{CatalogError, ProductRepository};
pub use routes::{build_app, build_router};

/// Load `.env` and initialize logging
pub fn setup_environment() {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let config = Config::from_env();
    utils::logger::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    if dotenv_loaded {
        tracing::debug!("Loaded .env");
    }
}
