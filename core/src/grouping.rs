//! Rebuilding nested order summaries from flat rows.
//!
//! The flat projection trades one round trip for a wider result set: every
//! line item repeats its order's summary columns. [`regroup`] folds those rows
//! back into one [`OrderSummary`] per order.
//!
//! # Ordering
//!
//! Output follows first-seen order, both for orders and for the items inside
//! each order. Groups live in a `Vec` (the order of first appearance) and a
//! `HashMap` points from each grouping key to its slot, so the result does
//! not depend on hash iteration order.
//!
//! # Pagination
//!
//! A flat join multiplies rows by line items, so an offset/limit applied to it
//! counts lines, not orders. Regrouped results are therefore never paged.

use crate::dto::{FlatRow, OrderLineItem, OrderSummary};
use crate::types::{Address, OrderId, OrderStatus};
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};

/// Grouping key: every summary column of a flat row.
///
/// Rows of the same order carry identical summary columns, so keying on the
/// whole tuple is equivalent to keying on the order id while also yielding
/// the summary fields without a second lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SummaryKey {
    order_id: OrderId,
    member_name: String,
    order_date: NaiveDateTime,
    status: OrderStatus,
    address: Address,
}

impl SummaryKey {
    fn of(row: &FlatRow) -> Self {
        Self {
            order_id: row.order_id,
            member_name: row.member_name.clone(),
            order_date: row.order_date,
            status: row.status,
            address: row.address.clone(),
        }
    }

    fn into_summary(self, items: Vec<OrderLineItem>) -> OrderSummary {
        OrderSummary::new(
            self.order_id,
            self.member_name,
            self.order_date,
            self.status,
            self.address,
        )
        .with_items(items)
    }
}

/// Fold flat join rows into one summary per order.
///
/// Rows may arrive in any order and orders may be interleaved. Rows without
/// item columns (outer-joined orders with no lines) open a group but add no
/// item.
///
/// # Example
///
/// ```
/// use shop_orders_core::grouping::regroup;
/// use shop_orders_core::{Address, FlatRow, OrderId, OrderStatus};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let row = |order: i64, item: &str| FlatRow {
///     order_id: OrderId::new(order),
///     member_name: format!("member-{order}"),
///     order_date: date,
///     status: OrderStatus::Ordered,
///     address: Address::default(),
///     item_name: Some(item.to_string()),
///     order_price: Some(100),
///     count: Some(1),
/// };
///
/// let summaries = regroup(vec![row(1, "A"), row(2, "X"), row(1, "B")]);
/// assert_eq!(summaries.len(), 2);
/// assert_eq!(summaries[0].order_items.len(), 2);
/// ```
#[must_use]
pub fn regroup(rows: impl IntoIterator<Item = FlatRow>) -> Vec<OrderSummary> {
    let mut slots: HashMap<SummaryKey, usize> = HashMap::new();
    let mut groups: Vec<(SummaryKey, Vec<OrderLineItem>)> = Vec::new();
    let mut seen_orders: HashSet<OrderId> = HashSet::new();

    for row in rows {
        let line = row.line_item();
        let key = SummaryKey::of(&row);

        let slot = if let Some(&slot) = slots.get(&key) {
            slot
        } else {
            if !seen_orders.insert(key.order_id) {
                tracing::warn!(
                    order_id = %key.order_id,
                    "Flat rows of one order disagree on summary columns; emitting a separate group"
                );
            }
            groups.push((key.clone(), Vec::new()));
            slots.insert(key, groups.len() - 1);
            groups.len() - 1
        };

        if let Some(line) = line {
            groups[slot].1.push(line);
        }
    }

    groups
        .into_iter()
        .map(|(key, items)| key.into_summary(items))
        .collect()
}

/// Bucket line items by owning order, keeping per-order insertion order.
#[must_use]
pub fn group_by_order(
    lines: impl IntoIterator<Item = OrderLineItem>,
) -> HashMap<OrderId, Vec<OrderLineItem>> {
    let mut by_order: HashMap<OrderId, Vec<OrderLineItem>> = HashMap::new();
    for line in lines {
        by_order.entry(line.order_id).or_default().push(line);
    }
    by_order
}

/// Attach bucketed line items to summaries; summaries without lines get an empty list.
#[must_use]
pub fn attach_line_items(
    summaries: Vec<OrderSummary>,
    mut by_order: HashMap<OrderId, Vec<OrderLineItem>>,
) -> Vec<OrderSummary> {
    summaries
        .into_iter()
        .map(|summary| {
            let items = by_order.remove(&summary.order_id).unwrap_or_default();
            summary.with_items(items)
        })
        .collect()
}
