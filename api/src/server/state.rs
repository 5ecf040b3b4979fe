//! Application state for the orders HTTP server.

use crate::service::OrderAggregationService;
use axum::extract::FromRef;
use chrono::FixedOffset;
use shop_orders_core::OrderStore;
use shop_orders_core::environment::Clock;
use std::fmt;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is behind an `Arc` or `Copy`.
#[derive(Clone)]
pub struct AppState {
    /// Strategy runner behind the listing endpoints
    pub service: Arc<OrderAggregationService>,

    /// Store pinged by the readiness probe
    pub store: Arc<dyn OrderStore>,

    /// Source of the envelope timestamp
    pub clock: Arc<dyn Clock>,

    /// Offset the envelope date is rendered in
    pub utc_offset: FixedOffset,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        service: Arc<OrderAggregationService>,
        store: Arc<dyn OrderStore>,
        clock: Arc<dyn Clock>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            service,
            store,
            clock,
            utc_offset,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("utc_offset", &self.utc_offset)
            .finish_non_exhaustive()
    }
}

// Lets the shared readiness handler extract the store from AppState
impl FromRef<AppState> for Arc<dyn OrderStore> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.store)
    }
}
