//! Database Module
//!
//! Opens the embedded SurrealDB store (RocksDB on disk, or in memory).

pub mod repository;

use std::path::Path;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::core::{Config, ServerResult};

/// Database service, owns the store handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open the store selected by `config` and select its namespace/database
    pub async fn new(config: &Config) -> ServerResult<Self> {
        let db = if config.is_memory_database() {
            Surreal::new::<Mem>(()).await?
        } else {
            let path = Path::new(&config.database_path);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            Surreal::new::<RocksDb>(path).await?
        };

        db.use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        tracing::info!(
            path = %config.database_path,
            namespace = %config.database_namespace,
            database = %config.database_name,
            "Database connection established"
        );

        Ok(Self { db })
    }
}
