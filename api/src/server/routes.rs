//! Router configuration for the orders service.

use super::state::AppState;
use crate::api::orders;
use axum::{Router, http::Uri, routing::get};
use shop_orders_web::handlers::{health_check, readiness_check};
use shop_orders_web::{AppError, correlation_id_layer};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `/health` and `/ready` at the root
/// - the seven listing versions under `/api`
/// - a JSON 404 for everything else
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/v1/orders", get(orders::list_orders_v1))
        .route("/v2/orders", get(orders::list_orders_v2))
        .route("/v3/orders", get(orders::list_orders_v3))
        .route("/v3.1/orders", get(orders::list_orders_v3_1))
        .route("/v4/orders", get(orders::list_orders_v4))
        .route("/v5/orders", get(orders::list_orders_v5))
        .route("/v6/orders", get(orders::list_orders_v6));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}

#[allow(clippy::unused_async)]
async fn not_found(uri: Uri) -> AppError {
    AppError::route_not_found(uri.path())
}
