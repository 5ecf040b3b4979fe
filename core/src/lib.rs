//! # Shop Orders Core
//!
//! Domain model and query ports for the shop order read API.
//!
//! This crate provides the pieces every order-listing strategy shares:
//!
//! - **Storage entities** ([`types`]): `Order`, `Member`, `Delivery`, `Item`,
//!   `OrderItem` as they live in the relational store. Never serialized to clients.
//! - **Read projections** ([`dto`]): `OrderSummary`, `OrderLineItem`, `FlatRow`.
//! - **Query ports** ([`store`]): `OrderStore` opens a `ReadScope`, the unit of
//!   work every strategy runs in.
//! - **Paging** ([`page`]) and **search filters** ([`store::OrderSearch`]).
//! - **Regrouping** ([`grouping`]): rebuilds nested summaries from flat join rows.
//! - **Sample data** ([`dataset`]): table contents for the in-memory store and seeding.
//!
//! ## Query Shapes
//!
//! ```text
//! Entity graph                         Read projection
//! ┌────────┐  1   ┌────────┐           ┌──────────────────────┐
//! │ Order  │─────▶│ Member │           │ OrderSummary         │
//! │        │  1   ├────────┤    ──▶    │  member_name         │
//! │        │─────▶│Delivery│           │  address             │
//! │        │  *   ├────────┤  1 ┌────┐ │  order_items[]       │
//! │        │─────▶│OrderItm│───▶│Item│ │   item_name, price.. │
//! └────────┘      └────────┘    └────┘ └──────────────────────┘
//! ```
//!
//! Each strategy decides how many round trips the arrows above cost.

pub mod dataset;
pub mod dto;
pub mod error;
pub mod grouping;
pub mod page;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDateTime, Utc};
pub use dto::{FlatRow, OrderLineItem, OrderSummary};
pub use error::{QueryError, Result};
pub use page::Page;
pub use store::{FlatJoin, OrderSearch, OrderStore, ReadScope};
pub use types::{
    Address, Delivery, DeliveryId, DeliveryStatus, Item, ItemId, Member, MemberId, Order,
    OrderId, OrderItem, OrderItemId, OrderStatus, OrderWithParties,
};

/// Environment module - abstracted dependencies injected into the service layer.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use shop_orders_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
