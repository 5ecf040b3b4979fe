//! Plain in-memory description of shop data.
//!
//! A [`Dataset`] is what the in-memory store serves and what the Postgres
//! loader inserts. Identifiers are assigned sequentially per table, starting
//! at 1, in insertion order.

use crate::types::{
    Address, Delivery, DeliveryId, DeliveryStatus, Item, ItemId, Member, MemberId, Order, OrderId,
    OrderItem, OrderItemId, OrderStatus,
};
use chrono::{NaiveDate, NaiveDateTime};

/// Shop tables held as vectors, in primary-key order.
///
/// # Example
///
/// ```
/// use shop_orders_core::dataset::Dataset;
/// use shop_orders_core::{Address, OrderStatus};
/// use chrono::NaiveDate;
///
/// let mut data = Dataset::new();
/// let alice = data.add_member("alice", Address::new("Seoul", "1", "1111"));
/// let book = data.add_item("Rust Book", 30000, 10);
/// let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
/// let order = data.add_order(alice, date, OrderStatus::Ordered, &[(book, 30000, 1)]);
///
/// assert_eq!(order.get(), 1);
/// assert_eq!(data.order_items().len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    members: Vec<Member>,
    deliveries: Vec<Delivery>,
    items: Vec<Item>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

impl Dataset {
    /// Creates an empty dataset
    #[must_use]
    pub const fn new() -> Self {
        Self {
            members: Vec::new(),
            deliveries: Vec::new(),
            items: Vec::new(),
            orders: Vec::new(),
            order_items: Vec::new(),
        }
    }

    /// Adds a member and returns its id.
    pub fn add_member(&mut self, name: impl Into<String>, address: Address) -> MemberId {
        let id = MemberId::new(next_id(self.members.len()));
        self.members.push(Member {
            id,
            name: name.into(),
            address,
        });
        id
    }

    /// Adds a catalogue item and returns its id.
    pub fn add_item(&mut self, name: impl Into<String>, price: i32, stock_quantity: i32) -> ItemId {
        let id = ItemId::new(next_id(self.items.len()));
        self.items.push(Item {
            id,
            name: name.into(),
            price,
            stock_quantity,
        });
        id
    }

    /// Adds an order shipped to the member's home address.
    ///
    /// `lines` are `(item, order_price, count)` triples, stored in the given order.
    pub fn add_order(
        &mut self,
        member_id: MemberId,
        order_date: NaiveDateTime,
        status: OrderStatus,
        lines: &[(ItemId, i32, i32)],
    ) -> OrderId {
        let address = self
            .member(member_id)
            .map(|member| member.address.clone())
            .unwrap_or_default();
        let delivery_id = DeliveryId::new(next_id(self.deliveries.len()));
        self.deliveries.push(Delivery {
            id: delivery_id,
            address,
            status: DeliveryStatus::Ready,
        });

        let id = OrderId::new(next_id(self.orders.len()));
        self.orders.push(Order {
            id,
            member_id,
            delivery_id,
            order_date,
            status,
        });

        for &(item_id, order_price, count) in lines {
            self.add_order_item(id, item_id, order_price, count);
        }
        id
    }

    /// Appends one line to an existing order.
    ///
    /// Lines of different orders may be interleaved this way, which changes the
    /// natural row order of the flat join.
    pub fn add_order_item(
        &mut self,
        order_id: OrderId,
        item_id: ItemId,
        order_price: i32,
        count: i32,
    ) -> OrderItemId {
        let id = OrderItemId::new(next_id(self.order_items.len()));
        self.order_items.push(OrderItem {
            id,
            order_id,
            item_id,
            order_price,
            count,
        });
        id
    }

    /// All members
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// All deliveries
    #[must_use]
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    /// All items
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All orders
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// All order lines
    #[must_use]
    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_items
    }

    /// Look up a member
    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Look up a delivery
    #[must_use]
    pub fn delivery(&self, id: DeliveryId) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| d.id == id)
    }

    /// Look up an item
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Whether the dataset holds no orders
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// The demo shop: two members, one order of two books each.
    #[must_use]
    pub fn sample() -> Self {
        let mut data = Self::new();

        let user_a = data.add_member("userA", Address::new("서울", "1", "1111"));
        let jpa1 = data.add_item("JPA1 BOOK", 10000, 100);
        let jpa2 = data.add_item("JPA2 BOOK", 20000, 100);
        data.add_order(
            user_a,
            sample_date(1, 10),
            OrderStatus::Ordered,
            &[(jpa1, 10000, 1), (jpa2, 20000, 2)],
        );

        let user_b = data.add_member("userB", Address::new("진주", "2", "2222"));
        let spring1 = data.add_item("SPRING1 BOOK", 20000, 200);
        let spring2 = data.add_item("SPRING2 BOOK", 40000, 300);
        data.add_order(
            user_b,
            sample_date(2, 15),
            OrderStatus::Ordered,
            &[(spring1, 20000, 3), (spring2, 40000, 4)],
        );

        data
    }
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).map_or(i64::MAX, |n| n + 1)
}

fn sample_date(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_per_table() {
        let mut data = Dataset::new();
        let a = data.add_member("a", Address::default());
        let b = data.add_member("b", Address::default());
        let item = data.add_item("x", 1, 1);
        assert_eq!((a.get(), b.get(), item.get()), (1, 2, 1));
    }

    #[test]
    fn test_order_ships_to_member_address() {
        let mut data = Dataset::new();
        let member = data.add_member("a", Address::new("Busan", "9", "9999"));
        let order = data.add_order(member, sample_date(3, 1), OrderStatus::Canceled, &[]);

        let delivery_id = data.orders()[0].delivery_id;
        assert_eq!(order.get(), 1);
        assert_eq!(data.delivery(delivery_id).map(|d| d.address.city.as_str()), Some("Busan"));
        assert!(data.order_items().is_empty());
    }

    #[test]
    fn test_sample_shape() {
        let data = Dataset::sample();
        assert_eq!(data.members().len(), 2);
        assert_eq!(data.orders().len(), 2);
        assert_eq!(data.order_items().len(), 4);
        assert_eq!(data.items()[3].name, "SPRING2 BOOK");
    }
}
