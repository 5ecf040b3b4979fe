//! End-to-end HTTP tests against the router with an in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use orders_api::{Config, app};
use serde_json::Value;
use shop_orders_core::dataset::Dataset;
use shop_orders_testing::{InMemoryOrderStore, fixtures, test_clock};
use shop_orders_web::CORRELATION_ID_HEADER;
use std::sync::Arc;
use tower::ServiceExt;

fn router_over(store: &InMemoryOrderStore) -> Router {
    app(Arc::new(store.clone()), Arc::new(test_clock()), &Config::default())
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_envelope_shape() {
    let store = InMemoryOrderStore::with_dataset(Dataset::sample());

    let (status, body) = get(router_over(&store), "/api/v4/orders").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["date"], "2025-01-01-Wed 09:00:00");

    let first = &body["data"][0];
    assert_eq!(first["orderId"], 1);
    assert_eq!(first["memberName"], "userA");
    assert_eq!(first["status"], "ORDERED");
    assert_eq!(first["address"]["zipcode"], "1111");
    assert_eq!(first["orderItems"][0]["itemName"], "JPA1 BOOK");
    assert_eq!(first["orderItems"][1]["orderPrice"], 20000);
    assert_eq!(first["orderItems"][1]["count"], 2);
    assert!(first["orderItems"][0].get("orderId").is_none());
}

#[tokio::test]
async fn test_every_version_serves_the_same_listing() {
    let store = InMemoryOrderStore::with_dataset(Dataset::sample());
    let (_, reference) = get(router_over(&store), "/api/v1/orders").await;

    for version in ["v2", "v3", "v3.1", "v4", "v5", "v6"] {
        let (status, body) = get(router_over(&store), &format!("/api/{version}/orders")).await;
        assert_eq!(status, StatusCode::OK, "{version}");
        assert_eq!(body["data"], reference["data"], "{version}");
        assert_eq!(body["count"], 2, "{version}");
    }
}

#[tokio::test]
async fn test_paged_endpoint_windows() {
    let store = InMemoryOrderStore::with_dataset(fixtures::three_orders_last_empty());

    let (_, first) = get(router_over(&store), "/api/v3.1/orders?offset=0&limit=2").await;
    let (_, second) = get(router_over(&store), "/api/v3.1/orders?offset=2&limit=2").await;

    assert_eq!(first["count"], 2);
    assert_eq!(first["data"][1]["orderId"], 2);
    assert_eq!(second["count"], 1);
    assert_eq!(second["data"][0]["orderId"], 3);
    assert_eq!(second["data"][0]["orderItems"], Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_invalid_paging_is_bad_request() {
    let store = InMemoryOrderStore::with_dataset(Dataset::sample());

    for uri in [
        "/api/v3.1/orders?limit=0",
        "/api/v3.1/orders?offset=-1",
        "/api/v3.1/orders?limit=many",
    ] {
        let (status, body) = get(router_over(&store), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "BAD_REQUEST", "{uri}");
    }
    assert_eq!(store.query_count(), 0);
}

#[tokio::test]
async fn test_filters_on_entity_endpoints() {
    let store = InMemoryOrderStore::with_dataset(fixtures::three_orders_last_empty());

    let (status, body) = get(router_over(&store), "/api/v2/orders?orderStatus=CANCELED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["memberName"], "lee");

    let (status, _) = get(router_over(&store), "/api/v1/orders?orderStatus=SHIPPED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unavailable_store_is_service_unavailable() {
    let store = InMemoryOrderStore::with_dataset(Dataset::sample());
    store.set_unavailable(true);

    let (status, _) = get(router_over(&store), "/api/v5/orders").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = get(router_over(&store), "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");

    // Liveness does not depend on the store
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router_over(&store).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let store = InMemoryOrderStore::new();

    let (status, body) = get(router_over(&store), "/api/v7/orders").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("/api/v7/orders"));
}

#[tokio::test]
async fn test_correlation_id_echoed() {
    let store = InMemoryOrderStore::with_dataset(Dataset::sample());
    let id = "6f1c1f5e-93a4-4b8e-9a59-0c2f8e7d1a10";
    let request = Request::builder()
        .uri("/api/v6/orders")
        .header(CORRELATION_ID_HEADER, id)
        .body(Body::empty())
        .unwrap();

    let response = router_over(&store).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echoed = response
        .headers()
        .get(CORRELATION_ID_HEADER)
        .expect("correlation header")
        .to_str()
        .unwrap();
    assert_eq!(echoed, id);
}
