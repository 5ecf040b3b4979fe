//! Query ports onto the relational store.
//!
//! # Overview
//!
//! Every strategy runs inside one [`ReadScope`], opened through
//! [`OrderStore::begin_read`] and closed once the response is assembled.
//! The scope is the unit of work: a read-only transaction for Postgres, a
//! snapshot handle for the in-memory store.
//!
//! Each method on [`ReadScope`] is exactly one round trip. That property is
//! what makes query counts observable: [`ReadScope::queries_issued`] tells the
//! caller how many round trips a strategy cost.
//!
//! ## Query Families
//!
//! ```text
//! Entity queries              Projection queries
//! ┌─────────────────────┐     ┌──────────────────────────┐
//! │ find_orders         │     │ find_order_summaries     │
//! │ find_member         │     │ find_line_items          │
//! │ find_delivery       │     │ find_line_items_in       │
//! │ find_order_items_in │     │ find_flat_rows           │
//! │ find_item(s_in)     │     └──────────────────────────┘
//! │ find_orders_with_   │
//! │   member_delivery   │
//! └─────────────────────┘
//! ```
//!
//! ## Closed Scopes
//!
//! After [`ReadScope::close`] every query returns [`QueryError::ScopeClosed`].
//! Resolving an association that late is a programming error, not an outage,
//! so it never surfaces as [`QueryError::StoreUnavailable`].
//!
//! [`QueryError::ScopeClosed`]: crate::QueryError::ScopeClosed
//! [`QueryError::StoreUnavailable`]: crate::QueryError::StoreUnavailable

use crate::dto::{FlatRow, OrderLineItem, OrderSummary};
use crate::error::Result;
use crate::page::Page;
use crate::types::{
    Delivery, DeliveryId, Item, ItemId, Member, MemberId, Order, OrderId, OrderItem, OrderStatus,
    OrderWithParties,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filters for the entity-level order search.
///
/// An empty search matches every order and is unbounded. A search with at
/// least one filter is capped at [`OrderSearch::MAX_RESULTS`]. Results are
/// ordered by order id ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSearch {
    /// Substring of the member name
    pub member_name: Option<String>,
    /// Exact order status
    pub order_status: Option<OrderStatus>,
}

impl OrderSearch {
    /// Maximum number of orders a filtered search returns.
    pub const MAX_RESULTS: usize = 1000;

    /// Whether no filter is set.
    #[must_use]
    pub const fn is_unfiltered(&self) -> bool {
        self.member_name.is_none() && self.order_status.is_none()
    }

    /// Row cap for this search; `None` when unfiltered.
    #[must_use]
    pub const fn result_limit(&self) -> Option<usize> {
        if self.is_unfiltered() {
            None
        } else {
            Some(Self::MAX_RESULTS)
        }
    }

    /// Whether an order with the given member name and status passes the filters.
    #[must_use]
    pub fn matches(&self, member_name: &str, status: OrderStatus) -> bool {
        let name_ok = self
            .member_name
            .as_deref()
            .is_none_or(|wanted| member_name.contains(wanted));
        let status_ok = self.order_status.is_none_or(|wanted| wanted == status);
        name_ok && status_ok
    }
}

/// Join policy for the flat order × line-item projection.
///
/// Under [`FlatJoin::Inner`] an order without line items produces no rows and
/// is therefore absent from the regrouped result. [`FlatJoin::LeftOuter`]
/// keeps such orders with an empty item list, matching the other strategies.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatJoin {
    /// `INNER JOIN`: orders without lines are dropped
    #[default]
    Inner,
    /// `LEFT OUTER JOIN`: orders without lines yield one row with empty item columns
    LeftOuter,
}

impl FromStr for FlatJoin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "outer" | "left_outer" | "left" => Ok(Self::LeftOuter),
            other => Err(format!("Unknown flat join policy: {other}")),
        }
    }
}

impl fmt::Display for FlatJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => f.write_str("inner"),
            Self::LeftOuter => f.write_str("left_outer"),
        }
    }
}

/// Entry point into the relational store.
///
/// Shared across requests behind an `Arc<dyn OrderStore>`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Open a read scope for one unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StoreUnavailable`](crate::QueryError::StoreUnavailable)
    /// if no connection or transaction can be obtained.
    async fn begin_read(&self) -> Result<Box<dyn ReadScope>>;

    /// Cheap connectivity probe used by readiness checks.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StoreUnavailable`](crate::QueryError::StoreUnavailable)
    /// if the store cannot be reached.
    async fn ping(&self) -> Result<()>;
}

/// One unit of read work. Every query method is one round trip.
///
/// All list queries return rows ordered by primary key ascending unless noted.
///
/// # Errors
///
/// Every query method returns
/// [`QueryError::ScopeClosed`](crate::QueryError::ScopeClosed) once the scope
/// has been closed, and
/// [`QueryError::StoreUnavailable`](crate::QueryError::StoreUnavailable) on
/// connectivity or transaction failure.
#[async_trait]
pub trait ReadScope: Send {
    // ----- entity queries -------------------------------------------------

    /// Search order headers.
    async fn find_orders(&mut self, search: &OrderSearch) -> Result<Vec<Order>>;

    /// Resolve one member (to-one).
    async fn find_member(&mut self, id: MemberId) -> Result<Member>;

    /// Resolve one delivery (to-one).
    async fn find_delivery(&mut self, id: DeliveryId) -> Result<Delivery>;

    /// Resolve the lines of one order (to-many).
    async fn find_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    /// Resolve the lines of several orders with one `IN` query.
    async fn find_order_items_in(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderItem>>;

    /// Resolve one item (to-one from a line).
    async fn find_item(&mut self, id: ItemId) -> Result<Item>;

    /// Resolve several items with one `IN` query.
    async fn find_items_in(&mut self, ids: &[ItemId]) -> Result<Vec<Item>>;

    /// Fetch orders joined with member and delivery in a single query,
    /// optionally windowed. Ordered by order id ascending.
    async fn find_orders_with_member_delivery(
        &mut self,
        page: Option<Page>,
    ) -> Result<Vec<OrderWithParties>>;

    // ----- projection queries ---------------------------------------------

    /// Summary rows (order × member × delivery) without line items.
    async fn find_order_summaries(&mut self) -> Result<Vec<OrderSummary>>;

    /// Line-item projection for one order.
    async fn find_line_items(&mut self, order_id: OrderId) -> Result<Vec<OrderLineItem>>;

    /// Line-item projection for several orders with one `IN` query.
    async fn find_line_items_in(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderLineItem>>;

    /// The denormalized order × line-item join.
    ///
    /// Row order is whatever the store delivers; callers must not rely on it.
    async fn find_flat_rows(&mut self, join: FlatJoin) -> Result<Vec<FlatRow>>;

    // ----- lifecycle ------------------------------------------------------

    /// Number of round trips issued through this scope so far.
    fn queries_issued(&self) -> usize;

    /// Whether the scope still accepts queries.
    fn is_open(&self) -> bool;

    /// End the unit of work. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_matches_everything() {
        let search = OrderSearch::default();
        assert!(search.matches("anyone", OrderStatus::Ordered));
        assert!(search.matches("", OrderStatus::Canceled));
    }

    #[test]
    fn test_search_filters_combine() {
        let search = OrderSearch {
            member_name: Some("user".to_string()),
            order_status: Some(OrderStatus::Canceled),
        };
        assert!(search.matches("userA", OrderStatus::Canceled));
        assert!(!search.matches("userA", OrderStatus::Ordered));
        assert!(!search.matches("admin", OrderStatus::Canceled));
    }

    #[test]
    fn test_only_filtered_searches_are_capped() {
        assert_eq!(OrderSearch::default().result_limit(), None);

        let by_status = OrderSearch {
            order_status: Some(OrderStatus::Ordered),
            ..OrderSearch::default()
        };
        assert_eq!(by_status.result_limit(), Some(OrderSearch::MAX_RESULTS));
    }

    #[test]
    fn test_flat_join_parse() {
        assert_eq!("inner".parse::<FlatJoin>(), Ok(FlatJoin::Inner));
        assert_eq!("OUTER".parse::<FlatJoin>(), Ok(FlatJoin::LeftOuter));
        assert!("cross".parse::<FlatJoin>().is_err());
        assert_eq!(FlatJoin::default(), FlatJoin::Inner);
    }
}
