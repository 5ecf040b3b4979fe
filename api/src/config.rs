//! Configuration management for the orders API.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file is honoured when present (see `main`).

use crate::service::QuerySettings;
use shop_orders_core::FlatJoin;
use shop_orders_postgres::PoolSettings;
use shop_orders_web::envelope::DEFAULT_UTC_OFFSET_SECONDS;
use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `PostgreSQL` configuration
    pub database: DatabaseConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Strategy tuning and response formatting
    pub query: QueryConfig,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection URL; `None` serves the in-memory sample shop
    pub url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
    /// Run embedded migrations at startup
    pub run_migrations: bool,
    /// Insert the sample shop when the tables are empty
    pub seed_sample_data: bool,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Query configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Ids per `IN` query for v3/v3.1; 0 disables batching
    pub batch_fetch_size: usize,
    /// Join policy for v6
    pub flat_join: FlatJoin,
    /// Envelope date offset, seconds east of UTC
    pub utc_offset_seconds: i32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: lookup("DATABASE_MIN_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1),
                connect_timeout: lookup("DATABASE_CONNECT_TIMEOUT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                run_migrations: lookup("DATABASE_RUN_MIGRATIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
                seed_sample_data: lookup("DATABASE_SEED_SAMPLE_DATA")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
            },
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("PORT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
                log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            },
            query: QueryConfig {
                batch_fetch_size: lookup("BATCH_FETCH_SIZE")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(QuerySettings::DEFAULT_BATCH_FETCH_SIZE),
                flat_join: lookup("FLAT_JOIN")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
                utc_offset_seconds: lookup("RESPONSE_UTC_OFFSET_SECONDS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_UTC_OFFSET_SECONDS),
            },
        }
    }

    /// Socket address to bind, as `host:port`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Strategy settings derived from the query section
    #[must_use]
    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            batch_fetch_size: NonZeroUsize::new(self.query.batch_fetch_size),
            flat_join: self.query.flat_join,
        }
    }

    /// Pool sizing derived from the database section
    #[must_use]
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            connect_timeout: Duration::from_secs(self.database.connect_timeout),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
