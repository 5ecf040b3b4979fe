//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use shop_orders_core::OrderStore;
use std::sync::Arc;

/// Readiness report body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Component that was checked
    pub component: &'static str,
    /// `ok` or `unavailable`
    pub status: &'static str,
    /// Failure detail, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check the order store.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check: pings the order store.
///
/// # Status Codes
///
/// - 200 OK: the store answered
/// - 503 Service Unavailable: the store could not be reached
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
///
/// # Response
///
/// ```json
/// { "component": "order_store", "status": "ok" }
/// ```
pub async fn readiness_check(
    State(store): State<Arc<dyn OrderStore>>,
) -> (StatusCode, Json<HealthReport>) {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthReport {
                component: "order_store",
                status: "ok",
                message: None,
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport {
                    component: "order_store",
                    status: "unavailable",
                    message: Some(err.to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_orders_testing::InMemoryOrderStore;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_ready_when_store_answers() {
        let store: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());

        let (status, Json(report)) = readiness_check(State(store)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "ok");
        assert!(report.message.is_none());
    }

    #[tokio::test]
    async fn test_not_ready_when_store_is_down() {
        let backend = InMemoryOrderStore::new();
        backend.set_unavailable(true);
        let store: Arc<dyn OrderStore> = Arc::new(backend);

        let (status, Json(report)) = readiness_check(State(store)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, "unavailable");
    }
}
