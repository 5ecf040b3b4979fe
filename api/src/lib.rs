//! # Orders API
//!
//! HTTP read API listing shop orders, each version built with a different
//! data-fetching strategy over the same [`OrderStore`].
//!
//! ## Architecture
//!
//! ```text
//! axum router ─▶ api::orders handlers ─▶ OrderAggregationService
//!                                              │ one ReadScope per call
//!                                              ▼
//!                             PostgresOrderStore | InMemoryOrderStore
//! ```
//!
//! - [`config`]: environment-driven settings
//! - [`service`]: the strategies and their round-trip accounting
//! - [`api`]: listing handlers wrapping results in the response envelope
//! - [`server`]: state, router and shutdown

pub mod api;
pub mod config;
pub mod server;
pub mod service;

pub use config::Config;
pub use server::{AppState, build_router};
pub use service::{OrderAggregationService, QuerySettings, Strategy};

use axum::Router;
use shop_orders_core::OrderStore;
use shop_orders_core::environment::Clock;
use shop_orders_web::envelope::utc_offset;
use std::sync::Arc;

/// Wire a store and clock into a ready-to-serve router using `config`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use orders_api::{Config, app};
/// use shop_orders_core::dataset::Dataset;
/// use shop_orders_core::environment::SystemClock;
/// use shop_orders_testing::InMemoryOrderStore;
///
/// let store = InMemoryOrderStore::with_dataset(Dataset::sample());
/// let _router = app(Arc::new(store), Arc::new(SystemClock), &Config::default());
/// ```
pub fn app(store: Arc<dyn OrderStore>, clock: Arc<dyn Clock>, config: &Config) -> Router {
    let service = OrderAggregationService::new(Arc::clone(&store), config.query_settings());
    let state = AppState::new(
        Arc::new(service),
        store,
        clock,
        utc_offset(config.query.utc_offset_seconds),
    );
    build_router(state)
}
