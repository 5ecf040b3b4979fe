//! Row shapes returned by the read queries and their mapping onto domain types.
//!
//! Status columns are stored as text and parsed on the way out, so a value the
//! domain does not know surfaces as [`QueryError::Decode`].

use chrono::NaiveDateTime;
use shop_orders_core::{
    Address, Delivery, DeliveryId, FlatRow, Item, ItemId, Member, MemberId, Order, OrderId,
    OrderItem, OrderItemId, OrderLineItem, OrderSummary, OrderWithParties, QueryError,
};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    pub order_id: i64,
    pub member_id: i64,
    pub delivery_id: i64,
    pub order_date: NaiveDateTime,
    pub status: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = QueryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.order_id),
            member_id: MemberId::new(row.member_id),
            delivery_id: DeliveryId::new(row.delivery_id),
            order_date: row.order_date,
            status: row.status.parse()?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MemberRow {
    pub member_id: i64,
    pub name: String,
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Self {
            id: MemberId::new(row.member_id),
            name: row.name,
            address: Address::new(row.city, row.street, row.zipcode),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DeliveryRow {
    pub delivery_id: i64,
    pub city: String,
    pub street: String,
    pub zipcode: String,
    pub status: String,
}

impl TryFrom<DeliveryRow> for Delivery {
    type Error = QueryError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DeliveryId::new(row.delivery_id),
            address: Address::new(row.city, row.street, row.zipcode),
            status: row.status.parse()?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemRow {
    pub item_id: i64,
    pub name: String,
    pub price: i32,
    pub stock_quantity: i32,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: ItemId::new(row.item_id),
            name: row.name,
            price: row.price,
            stock_quantity: row.stock_quantity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderItemRow {
    pub order_item_id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub order_price: i32,
    pub count: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.order_item_id),
            order_id: OrderId::new(row.order_id),
            item_id: ItemId::new(row.item_id),
            order_price: row.order_price,
            count: row.count,
        }
    }
}

/// Order joined with its member and delivery in one row.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderPartiesRow {
    pub order_id: i64,
    pub member_id: i64,
    pub delivery_id: i64,
    pub order_date: NaiveDateTime,
    pub status: String,
    pub member_name: String,
    pub member_city: String,
    pub member_street: String,
    pub member_zipcode: String,
    pub delivery_city: String,
    pub delivery_street: String,
    pub delivery_zipcode: String,
    pub delivery_status: String,
}

impl TryFrom<OrderPartiesRow> for OrderWithParties {
    type Error = QueryError;

    fn try_from(row: OrderPartiesRow) -> Result<Self, Self::Error> {
        Ok(Self {
            order: Order {
                id: OrderId::new(row.order_id),
                member_id: MemberId::new(row.member_id),
                delivery_id: DeliveryId::new(row.delivery_id),
                order_date: row.order_date,
                status: row.status.parse()?,
            },
            member: Member {
                id: MemberId::new(row.member_id),
                name: row.member_name,
                address: Address::new(row.member_city, row.member_street, row.member_zipcode),
            },
            delivery: Delivery {
                id: DeliveryId::new(row.delivery_id),
                address: Address::new(row.delivery_city, row.delivery_street, row.delivery_zipcode),
                status: row.delivery_status.parse()?,
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SummaryRow {
    pub order_id: i64,
    pub member_name: String,
    pub order_date: NaiveDateTime,
    pub status: String,
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

impl TryFrom<SummaryRow> for OrderSummary {
    type Error = QueryError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(Self::new(
            OrderId::new(row.order_id),
            row.member_name,
            row.order_date,
            row.status.parse()?,
            Address::new(row.city, row.street, row.zipcode),
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LineRow {
    pub order_id: i64,
    pub item_name: String,
    pub order_price: i32,
    pub count: i32,
}

impl From<LineRow> for OrderLineItem {
    fn from(row: LineRow) -> Self {
        Self::new(OrderId::new(row.order_id), row.item_name, row.order_price, row.count)
    }
}

/// One row of the order × line join; item columns are null for outer-joined orders.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FlatJoinRow {
    pub order_id: i64,
    pub member_name: String,
    pub order_date: NaiveDateTime,
    pub status: String,
    pub city: String,
    pub street: String,
    pub zipcode: String,
    pub item_name: Option<String>,
    pub order_price: Option<i32>,
    pub count: Option<i32>,
}

impl TryFrom<FlatJoinRow> for FlatRow {
    type Error = QueryError;

    fn try_from(row: FlatJoinRow) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: OrderId::new(row.order_id),
            member_name: row.member_name,
            order_date: row.order_date,
            status: row.status.parse()?,
            address: Address::new(row.city, row.street, row.zipcode),
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        })
    }
}

/// Convert every row, failing on the first one that does not decode.
pub(crate) fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, QueryError>
where
    T: TryFrom<R, Error = QueryError>,
{
    rows.into_iter().map(T::try_from).collect()
}
