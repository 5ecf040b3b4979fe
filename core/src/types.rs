//! Storage entities of the shop domain.
//!
//! These mirror the relational tables one to one. They carry foreign keys
//! instead of object references, so an `Order` says nothing about its member
//! until a query resolves `member_id`. Read projections live in [`crate::dto`].

use crate::error::QueryError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw primary key.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw primary key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Primary key of an order
    OrderId
);
entity_id!(
    /// Primary key of a member
    MemberId
);
entity_id!(
    /// Primary key of a delivery
    DeliveryId
);
entity_id!(
    /// Primary key of a catalogue item
    ItemId
);
entity_id!(
    /// Primary key of an order line
    OrderItemId
);

/// Postal address, embedded in both members and deliveries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// City name
    pub city: String,
    /// Street
    pub street: String,
    /// Postal code
    pub zipcode: String,
}

impl Address {
    /// Creates a new address
    #[must_use]
    pub fn new(city: impl Into<String>, street: impl Into<String>, zipcode: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }
}

/// Lifecycle status of an order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed
    Ordered,
    /// Order cancelled
    Canceled,
}

impl OrderStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ordered => "ORDERED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDERED" => Ok(Self::Ordered),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(QueryError::Decode(format!("Invalid order status: {s}"))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipping status of a delivery.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Waiting to ship
    Ready,
    /// Delivered
    Comp,
}

impl DeliveryStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Comp => "COMP",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READY" => Ok(Self::Ready),
            "COMP" => Ok(Self::Comp),
            _ => Err(QueryError::Decode(format!("Invalid delivery status: {s}"))),
        }
    }
}

/// A shop customer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// Primary key
    pub id: MemberId,
    /// Display name
    pub name: String,
    /// Home address
    pub address: Address,
}

/// Shipping record of exactly one order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// Primary key
    pub id: DeliveryId,
    /// Ship-to address
    pub address: Address,
    /// Shipping status
    pub status: DeliveryStatus,
}

/// Catalogue item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// Primary key
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Current list price
    pub price: i32,
    /// Units in stock
    pub stock_quantity: i32,
}

/// Order header row. Associations are foreign keys only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    /// Primary key
    pub id: OrderId,
    /// Ordering member (to-one)
    pub member_id: MemberId,
    /// Delivery (to-one)
    pub delivery_id: DeliveryId,
    /// When the order was placed, in shop-local time
    pub order_date: NaiveDateTime,
    /// Lifecycle status
    pub status: OrderStatus,
}

/// One line of an order (to-many from [`Order`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderItem {
    /// Primary key; also the insertion order within an order
    pub id: OrderItemId,
    /// Owning order
    pub order_id: OrderId,
    /// Ordered item (to-one)
    pub item_id: ItemId,
    /// Price charged per unit at order time
    pub order_price: i32,
    /// Quantity
    pub count: i32,
}

/// An order fetched together with its to-one associations in a single join.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderWithParties {
    /// The order header
    pub order: Order,
    /// Joined member
    pub member: Member,
    /// Joined delivery
    pub delivery: Delivery,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in [OrderStatus::Ordered, OrderStatus::Canceled] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_unknown_status_is_decode_error() {
        let err = "SHIPPED".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, QueryError::Decode(_)));
        assert!("LOST".parse::<DeliveryStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&OrderStatus::Canceled).unwrap();
        assert_eq!(json, "\"CANCELED\"");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&OrderId::new(42)).unwrap();
        assert_eq!(json, "42");
        assert_eq!(OrderId::new(42).to_string(), "42");
    }
}
