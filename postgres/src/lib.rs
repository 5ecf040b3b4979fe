//! `PostgreSQL` read store for the shop order read API.
//!
//! Implements the [`OrderStore`] port from `shop-orders-core` over a sqlx
//! connection pool. Each [`ReadScope`] runs in its own read-only transaction,
//! so every strategy sees one consistent snapshot.
//!
//! # Example
//!
//! ```no_run
//! use shop_orders_postgres::{PoolSettings, PostgresOrderStore};
//! use shop_orders_core::OrderStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresOrderStore::connect("postgres://localhost/shop", &PoolSettings::default()).await?;
//! store.migrate().await?;
//!
//! let mut scope = store.begin_read().await?;
//! let summaries = scope.find_order_summaries().await?;
//! scope.close().await?;
//! println!("{} orders", summaries.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;
mod scope;

pub use scope::PostgresReadScope;

use async_trait::async_trait;
use shop_orders_core::dataset::Dataset;
use shop_orders_core::{OrderStore, QueryError, ReadScope, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Tables written by [`PostgresOrderStore::seed`], in insert order, with their key column.
const SEEDED_TABLES: [(&str, &str); 5] = [
    ("member", "member_id"),
    ("item", "item_id"),
    ("delivery", "delivery_id"),
    ("orders", "order_id"),
    ("order_item", "order_item_id"),
];

/// Connection pool sizing.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// How long to wait for a connection
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// PostgreSQL-backed order store.
#[derive(Clone, Debug)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StoreUnavailable`] if the database cannot be reached.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect(database_url)
            .await
            .map_err(|e| QueryError::unavailable(format!("Failed to connect: {e}")))?;

        tracing::info!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            "Database connection pool created"
        );
        Ok(Self::new(pool))
    }

    /// Create the shop tables if they don't already exist.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StoreUnavailable`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| QueryError::unavailable(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// Load a dataset into empty tables, keeping its identifiers.
    ///
    /// Does nothing if any shop table already holds rows. Returns whether rows
    /// were written.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StoreUnavailable`] if an insert fails; nothing is
    /// written in that case.
    pub async fn seed(&self, data: &Dataset) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin seed transaction", e))?;

        for (table, _) in SEEDED_TABLES {
            let (populated,): (bool,) =
                sqlx::query_as(&format!("SELECT EXISTS (SELECT 1 FROM {table})"))
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("check seeded table", e))?;
            if populated {
                tracing::info!(table, "Shop tables already populated, skipping seed");
                return Ok(false);
            }
        }

        for member in data.members() {
            sqlx::query(
                "INSERT INTO member (member_id, name, city, street, zipcode) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(member.id.get())
            .bind(&member.name)
            .bind(&member.address.city)
            .bind(&member.address.street)
            .bind(&member.address.zipcode)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert member", e))?;
        }

        for item in data.items() {
            sqlx::query("INSERT INTO item (item_id, name, price, stock_quantity) VALUES ($1, $2, $3, $4)")
                .bind(item.id.get())
                .bind(&item.name)
                .bind(item.price)
                .bind(item.stock_quantity)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert item", e))?;
        }

        for delivery in data.deliveries() {
            sqlx::query(
                "INSERT INTO delivery (delivery_id, city, street, zipcode, status) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(delivery.id.get())
            .bind(&delivery.address.city)
            .bind(&delivery.address.street)
            .bind(&delivery.address.zipcode)
            .bind(delivery.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert delivery", e))?;
        }

        for order in data.orders() {
            sqlx::query(
                r"
                INSERT INTO orders (order_id, member_id, delivery_id, order_date, status)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order.id.get())
            .bind(order.member_id.get())
            .bind(order.delivery_id.get())
            .bind(order.order_date)
            .bind(order.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert order", e))?;
        }

        for line in data.order_items() {
            sqlx::query(
                r"
                INSERT INTO order_item (order_item_id, order_id, item_id, order_price, count)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(line.id.get())
            .bind(line.order_id.get())
            .bind(line.item_id.get())
            .bind(line.order_price)
            .bind(line.count)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert order item", e))?;
        }

        // Explicit ids bypass the sequences; move them past the seeded rows.
        for (table, column) in SEEDED_TABLES {
            let sql = format!(
                "SELECT setval(pg_get_serial_sequence('{table}', '{column}'), \
                 COALESCE((SELECT MAX({column}) FROM {table}), 0) + 1, false)"
            );
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("advance sequence", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit seed transaction", e))?;

        tracing::info!(
            orders = data.orders().len(),
            order_items = data.order_items().len(),
            "Seeded shop tables"
        );
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn begin_read(&self) -> Result<Box<dyn ReadScope>> {
        let scope = PostgresReadScope::begin(&self.pool).await?;
        Ok(Box::new(scope))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}

/// Classify a sqlx failure.
///
/// Row-to-type mapping problems are [`QueryError::Decode`]; everything else
/// means the store could not answer and is [`QueryError::StoreUnavailable`].
pub(crate) fn map_sqlx_error(context: &str, error: sqlx::Error) -> QueryError {
    match error {
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => {
            QueryError::Decode(format!("Failed to {context}: {error}"))
        }
        other => {
            tracing::warn!(error = %other, context, "Database request failed");
            QueryError::unavailable(format!("Failed to {context}: {other}"))
        }
    }
}
