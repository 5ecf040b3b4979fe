//! Read projections returned to clients.
//!
//! These are the only order shapes that reach the wire. They hold plain values
//! copied out of the entity graph: no foreign keys to follow, no back-references.

use crate::types::{Address, OrderId, OrderStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One order as listed by every endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// Order identifier
    pub order_id: OrderId,
    /// Name of the ordering member
    pub member_name: String,
    /// When the order was placed
    pub order_date: NaiveDateTime,
    /// Order status
    pub status: OrderStatus,
    /// Delivery address
    pub address: Address,
    /// Line items in insertion order
    pub order_items: Vec<OrderLineItem>,
}

impl OrderSummary {
    /// Creates a summary with no line items attached yet.
    #[must_use]
    pub const fn new(
        order_id: OrderId,
        member_name: String,
        order_date: NaiveDateTime,
        status: OrderStatus,
        address: Address,
    ) -> Self {
        Self {
            order_id,
            member_name,
            order_date,
            status,
            address,
            order_items: Vec::new(),
        }
    }

    /// Replaces the line items.
    #[must_use]
    pub fn with_items(mut self, order_items: Vec<OrderLineItem>) -> Self {
        self.order_items = order_items;
        self
    }
}

/// One line of an [`OrderSummary`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    /// Owning order. Used for grouping, not serialized.
    #[serde(skip)]
    pub order_id: OrderId,
    /// Item name
    pub item_name: String,
    /// Unit price charged
    pub order_price: i32,
    /// Quantity
    pub count: i32,
}

impl OrderLineItem {
    /// Creates a line item
    #[must_use]
    pub fn new(order_id: OrderId, item_name: impl Into<String>, order_price: i32, count: i32) -> Self {
        Self {
            order_id,
            item_name: item_name.into(),
            order_price,
            count,
        }
    }
}

/// One row of the order × line-item join.
///
/// The item columns are `None` only for an order without lines fetched under
/// [`crate::FlatJoin::LeftOuter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatRow {
    /// Order identifier
    pub order_id: OrderId,
    /// Name of the ordering member
    pub member_name: String,
    /// When the order was placed
    pub order_date: NaiveDateTime,
    /// Order status
    pub status: OrderStatus,
    /// Delivery address
    pub address: Address,
    /// Item name
    pub item_name: Option<String>,
    /// Unit price charged
    pub order_price: Option<i32>,
    /// Quantity
    pub count: Option<i32>,
}

impl FlatRow {
    /// Splits off the line-item columns, if the row carries any.
    #[must_use]
    pub fn line_item(&self) -> Option<OrderLineItem> {
        match (&self.item_name, self.order_price, self.count) {
            (Some(name), Some(price), Some(count)) => {
                Some(OrderLineItem::new(self.order_id, name.clone(), price, count))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_summary_serializes_camel_case_without_back_reference() {
        let summary = OrderSummary::new(
            OrderId::new(4),
            "userA".to_string(),
            date(),
            OrderStatus::Ordered,
            Address::new("Seoul", "1", "1111"),
        )
        .with_items(vec![OrderLineItem::new(OrderId::new(4), "JPA1 BOOK", 10000, 1)]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["orderId"], 4);
        assert_eq!(json["memberName"], "userA");
        assert_eq!(json["orderDate"], "2025-01-01T12:00:00");
        assert_eq!(json["status"], "ORDERED");
        assert_eq!(json["address"]["zipcode"], "1111");
        assert_eq!(json["orderItems"][0]["itemName"], "JPA1 BOOK");
        assert!(json["orderItems"][0].get("orderId").is_none());
    }

    #[test]
    fn test_flat_row_without_item_columns() {
        let row = FlatRow {
            order_id: OrderId::new(3),
            member_name: "userC".to_string(),
            order_date: date(),
            status: OrderStatus::Canceled,
            address: Address::default(),
            item_name: None,
            order_price: None,
            count: None,
        };
        assert!(row.line_item().is_none());
    }
}
