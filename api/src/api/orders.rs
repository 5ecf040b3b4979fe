//! Order listing endpoints.
//!
//! Every version returns the same `{ count, date, data }` envelope; they
//! differ only in how many store round trips it takes to build `data`:
//!
//! - GET /api/v1/orders - entities, fully materialized, then mapped
//! - GET /api/v2/orders - entities, mapped while resolving
//! - GET /api/v3/orders - orders joined with member and delivery
//! - GET /api/v3.1/orders?offset=&limit= - joined fetch, paged
//! - GET /api/v4/orders - summary projection plus lines per order
//! - GET /api/v5/orders - summary projection plus one batched line query
//! - GET /api/v6/orders - single flat join, regrouped

use crate::server::state::AppState;
use crate::service::Strategy;
use axum::extract::{Query, State, rejection::QueryRejection};
use serde::Deserialize;
use shop_orders_core::{OrderSearch, OrderSummary, Page};
use shop_orders_web::envelope::now_in;
use shop_orders_web::{AppError, CorrelationId, ResultEnvelope, WebResult};

/// Envelope returned by every listing endpoint.
pub type OrderListing = ResultEnvelope<Vec<OrderSummary>>;

/// `offset` / `limit` query parameters of the paged endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    /// First order (by id) to return; defaults to 0
    pub offset: Option<i64>,
    /// Maximum number of orders; defaults to 100
    pub limit: Option<i64>,
}

fn search_from(params: Result<Query<OrderSearch>, QueryRejection>) -> WebResult<OrderSearch> {
    params
        .map(|Query(search)| search)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

fn envelope(state: &AppState, orders: Vec<OrderSummary>) -> OrderListing {
    ResultEnvelope::of_list(orders, now_in(state.clock.as_ref(), state.utc_offset))
}

/// List orders by loading entities and resolving every association up front.
///
/// # Example
///
/// ```bash
/// curl 'http://localhost:8080/api/v1/orders?memberName=userA&orderStatus=ORDERED'
/// ```
///
/// # Errors
///
/// 400 for malformed filters, 503 when the store is unreachable.
pub async fn list_orders_v1(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    params: Result<Query<OrderSearch>, QueryRejection>,
) -> WebResult<OrderListing> {
    let search = search_from(params)?;
    tracing::debug!(%correlation_id, strategy = %Strategy::NaiveProjection, ?search, "Listing orders");

    let orders = state.service.naive_projection(&search).await?;
    Ok(envelope(&state, orders))
}

/// List orders, resolving associations while each summary is built.
///
/// # Errors
///
/// As [`list_orders_v1`].
pub async fn list_orders_v2(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    params: Result<Query<OrderSearch>, QueryRejection>,
) -> WebResult<OrderListing> {
    let search = search_from(params)?;
    tracing::debug!(%correlation_id, strategy = %Strategy::LazyDto, ?search, "Listing orders");

    let orders = state.service.lazy_dto(&search).await?;
    Ok(envelope(&state, orders))
}

/// List orders fetched together with member and delivery.
///
/// # Errors
///
/// 503 when the store is unreachable.
pub async fn list_orders_v3(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
) -> WebResult<OrderListing> {
    tracing::debug!(%correlation_id, strategy = %Strategy::JoinedFetch, "Listing orders");

    let orders = state.service.joined_fetch().await?;
    Ok(envelope(&state, orders))
}

/// List one window of orders, ordered by id.
///
/// # Example
///
/// ```bash
/// curl 'http://localhost:8080/api/v3.1/orders?offset=0&limit=2'
/// ```
///
/// # Errors
///
/// 400 when `offset < 0`, `limit <= 0` or either is not an integer.
pub async fn list_orders_v3_1(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    params: Result<Query<PageParams>, QueryRejection>,
) -> WebResult<OrderListing> {
    let Query(params) = params.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let offset = params.offset.unwrap_or(Page::DEFAULT_OFFSET);
    let limit = params.limit.unwrap_or(Page::DEFAULT_LIMIT);
    tracing::debug!(%correlation_id, strategy = %Strategy::PagedJoinedFetch, offset, limit, "Listing orders");

    let orders = state.service.paged_joined_fetch(offset, limit).await?;
    Ok(envelope(&state, orders))
}

/// List orders from the summary projection, lines fetched per order.
///
/// # Errors
///
/// 503 when the store is unreachable.
pub async fn list_orders_v4(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
) -> WebResult<OrderListing> {
    tracing::debug!(%correlation_id, strategy = %Strategy::PerFieldProjection, "Listing orders");

    let orders = state.service.per_field_projection().await?;
    Ok(envelope(&state, orders))
}

/// List orders from the summary projection, lines fetched in one query.
///
/// # Errors
///
/// 503 when the store is unreachable.
pub async fn list_orders_v5(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
) -> WebResult<OrderListing> {
    tracing::debug!(%correlation_id, strategy = %Strategy::BatchedProjection, "Listing orders");

    let orders = state.service.batched_projection().await?;
    Ok(envelope(&state, orders))
}

/// List orders from a single flat join.
///
/// With the default inner join, orders without lines are omitted.
///
/// # Errors
///
/// 503 when the store is unreachable.
pub async fn list_orders_v6(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
) -> WebResult<OrderListing> {
    tracing::debug!(%correlation_id, strategy = %Strategy::FlatProjection, "Listing orders");

    let orders = state.service.flat_projection().await?;
    Ok(envelope(&state, orders))
}
