/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 8000 | HTTP listen port |
/// | ENVIRONMENT | development | development / staging / production |
/// | DATABASE_PATH | data/catalog.db | RocksDB directory, `memory` for an in-memory store |
/// | DATABASE_NAMESPACE | catalog | SurrealDB namespace |
/// | DATABASE_NAME | product_catalog | SurrealDB database |
/// | LOG_LEVEL | info | Log level when `RUST_LOG` is unset |
/// | LOG_DIR | - | Directory for daily rolling log files |
/// | REQUEST_TIMEOUT_MS | 30000 | Per-request timeout |
///
/// # Example
///
/// ```ignore
/// DATABASE_PATH=memory HTTP_PORT=8080 cargo run -p catalog-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub environment: String,
    /// RocksDB data directory, or [`MEMORY_DATABASE`]
    pub database_path: String,
    pub database_namespace: String,
    pub database_name: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub request_timeout_ms: u64,
}

/// `DATABASE_PATH` value selecting the in-memory engine
pub const MEMORY_DATABASE: &str = "memory";

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/catalog.db".into()),
            database_namespace: std::env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "catalog".into()),
            database_name: std::env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "product_catalog".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
        }
    }

    /// In-memory configuration, used by tests
    pub fn in_memory() -> Self {
        Self {
            database_path: MEMORY_DATABASE.into(),
            log_dir: None,
            ..Self::from_env()
        }
    }

    pub fn is_memory_database(&self) -> bool {
        self.database_path == MEMORY_DATABASE
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
