use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line and environment configuration for `ordersvc`.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Replays JSON-lines order requests", long_about = None)]
pub struct Config {
    /// Input requests file, one JSON request per line
    pub input: PathBuf,

    /// Catalog JSON file with known customers and product prices (in-memory storage only)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// PostgreSQL connection URL. If provided, uses the Postgres store.
    #[arg(long, env = "ORDERS_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "ORDERS_DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[arg(long, env = "ORDERS_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// Log filter directives
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,
}

/// Where orders are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory { catalog: Option<PathBuf> },
    Postgres(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Config {
    pub fn storage_backend(&self) -> StorageBackend {
        match &self.database_url {
            Some(url) if !url.trim().is_empty() => StorageBackend::Postgres(PostgresConfig {
                url: url.clone(),
                max_connections: self.max_connections,
                acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
            }),
            _ => StorageBackend::InMemory {
                catalog: self.catalog.clone(),
            },
        }
    }
}
