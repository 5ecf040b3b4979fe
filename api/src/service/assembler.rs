//! Turning entity graphs into order summaries.
//!
//! Every function here takes an open [`ReadScope`] and resolves associations
//! through it. Nothing is cached beyond the scope: [`ItemCache`] lives exactly
//! as long as the unit of work that created it.

use shop_orders_core::grouping::{attach_line_items, group_by_order};
use shop_orders_core::{
    Delivery, Item, ItemId, Member, Order, OrderId, OrderItem, OrderLineItem, OrderSummary,
    OrderWithParties, QueryError, ReadScope, Result,
};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

/// An order with every association already resolved.
///
/// Mapping to an [`OrderSummary`] is pure: once an aggregate exists, no
/// further store access can happen, so the scope may be closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderAggregate {
    /// The order row
    pub order: Order,
    /// Ordering member
    pub member: Member,
    /// Shipping record
    pub delivery: Delivery,
    /// Lines with their catalogue items, in line-id order
    pub lines: Vec<(OrderItem, Item)>,
}

impl From<&OrderAggregate> for OrderSummary {
    fn from(aggregate: &OrderAggregate) -> Self {
        let items = aggregate
            .lines
            .iter()
            .map(|(line, item)| line_item(line, item))
            .collect();

        Self::new(
            aggregate.order.id,
            aggregate.member.name.clone(),
            aggregate.order.order_date,
            aggregate.order.status,
            aggregate.delivery.address.clone(),
        )
        .with_items(items)
    }
}

fn line_item(line: &OrderItem, item: &Item) -> OrderLineItem {
    OrderLineItem::new(line.order_id, item.name.clone(), line.order_price, line.count)
}

/// Identity map for items within one read scope.
///
/// A given item is loaded at most once per unit of work, however many lines
/// reference it.
#[derive(Debug, Default)]
pub struct ItemCache {
    items: HashMap<ItemId, Item>,
}

impl ItemCache {
    /// Empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached item or load it with one query.
    ///
    /// # Errors
    ///
    /// Propagates store errors; a missing item is a dangling reference.
    pub async fn get(&mut self, scope: &mut dyn ReadScope, id: ItemId) -> Result<Item> {
        if let Some(item) = self.items.get(&id) {
            return Ok(item.clone());
        }
        let item = scope.find_item(id).await?;
        self.items.insert(id, item.clone());
        Ok(item)
    }

    /// Load every uncached id, `batch` ids per query.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn preload(
        &mut self,
        scope: &mut dyn ReadScope,
        ids: &[ItemId],
        batch: NonZeroUsize,
    ) -> Result<()> {
        let mut seen = HashSet::new();
        let missing: Vec<ItemId> = ids
            .iter()
            .copied()
            .filter(|id| !self.items.contains_key(id) && seen.insert(*id))
            .collect();

        for chunk in missing.chunks(batch.get()) {
            for item in scope.find_items_in(chunk).await? {
                self.items.insert(item.id, item);
            }
        }
        Ok(())
    }

    /// Look up a preloaded item without touching the store.
    fn cached(&self, id: ItemId) -> Result<&Item> {
        self.items.get(&id).ok_or(QueryError::DanglingReference {
            entity: "item",
            id: id.get(),
        })
    }

    /// Number of distinct items held
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been loaded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Resolve every association of every order before any mapping happens.
///
/// Costs, per order: one member, one delivery, one order-line query, plus one
/// query per item not yet in `cache`.
///
/// # Errors
///
/// Propagates store errors.
pub async fn materialize(
    scope: &mut dyn ReadScope,
    orders: Vec<Order>,
    cache: &mut ItemCache,
) -> Result<Vec<OrderAggregate>> {
    let mut aggregates = Vec::with_capacity(orders.len());
    for order in orders {
        let member = scope.find_member(order.member_id).await?;
        let delivery = scope.find_delivery(order.delivery_id).await?;
        let mut lines = Vec::new();
        for line in scope.find_order_items(order.id).await? {
            let item = cache.get(scope, line.item_id).await?;
            lines.push((line, item));
        }
        aggregates.push(OrderAggregate {
            order,
            member,
            delivery,
            lines,
        });
    }
    Ok(aggregates)
}

/// Build each summary while resolving its associations on demand.
///
/// Produces the same output as [`materialize`] followed by mapping, but only
/// works while `scope` is open: a closed scope fails with
/// [`QueryError::ScopeClosed`] at the first association.
///
/// # Errors
///
/// Propagates store errors.
pub async fn summarize_lazily(
    scope: &mut dyn ReadScope,
    orders: Vec<Order>,
    cache: &mut ItemCache,
) -> Result<Vec<OrderSummary>> {
    let mut summaries = Vec::with_capacity(orders.len());
    for order in orders {
        let member_name = scope.find_member(order.member_id).await?.name;
        let address = scope.find_delivery(order.delivery_id).await?.address;
        let mut items = Vec::new();
        for line in scope.find_order_items(order.id).await? {
            let item = cache.get(scope, line.item_id).await?;
            items.push(line_item(&line, &item));
        }
        summaries.push(
            OrderSummary::new(order.id, member_name, order.order_date, order.status, address)
                .with_items(items),
        );
    }
    Ok(summaries)
}

fn summary_of(joined: &OrderWithParties) -> OrderSummary {
    OrderSummary::new(
        joined.order.id,
        joined.member.name.clone(),
        joined.order.order_date,
        joined.order.status,
        joined.delivery.address.clone(),
    )
}

/// Attach lines to pre-joined orders, one order-line query per order.
///
/// # Errors
///
/// Propagates store errors.
pub async fn attach_lines_per_order(
    scope: &mut dyn ReadScope,
    joined: Vec<OrderWithParties>,
    cache: &mut ItemCache,
) -> Result<Vec<OrderSummary>> {
    let mut summaries = Vec::with_capacity(joined.len());
    for parties in joined {
        let mut items = Vec::new();
        for line in scope.find_order_items(parties.order.id).await? {
            let item = cache.get(scope, line.item_id).await?;
            items.push(line_item(&line, &item));
        }
        summaries.push(summary_of(&parties).with_items(items));
    }
    Ok(summaries)
}

/// Attach lines to pre-joined orders with `IN` queries.
///
/// Order lines are fetched `batch` orders at a time, then their distinct
/// items `batch` ids at a time: `ceil(N / batch) + ceil(M / batch)` queries
/// for N orders and M distinct items.
///
/// # Errors
///
/// Propagates store errors; a line whose item did not come back is a
/// dangling reference.
pub async fn attach_lines_batched(
    scope: &mut dyn ReadScope,
    joined: Vec<OrderWithParties>,
    batch: NonZeroUsize,
    cache: &mut ItemCache,
) -> Result<Vec<OrderSummary>> {
    let order_ids: Vec<OrderId> = joined.iter().map(|j| j.order.id).collect();

    let mut lines: Vec<OrderItem> = Vec::new();
    for chunk in order_ids.chunks(batch.get()) {
        lines.extend(scope.find_order_items_in(chunk).await?);
    }

    let item_ids: Vec<ItemId> = lines.iter().map(|line| line.item_id).collect();
    cache.preload(scope, &item_ids, batch).await?;

    let mut resolved = Vec::with_capacity(lines.len());
    for line in &lines {
        resolved.push(line_item(line, cache.cached(line.item_id)?));
    }

    let summaries = joined.iter().map(summary_of).collect();
    Ok(attach_line_items(summaries, group_by_order(resolved)))
}
