//! In-memory order store for fast, deterministic testing.
//!
//! Serves a [`Dataset`] through the same [`OrderStore`]/[`ReadScope`] ports
//! as the Postgres backend, with two additions for tests:
//!
//! - a **query log**: every round trip is recorded by name, so tests can assert
//!   how many queries a strategy issued and of which kind;
//! - **failure injection**: [`InMemoryOrderStore::set_unavailable`] makes every
//!   subsequent scope open or query fail with `StoreUnavailable`.

use async_trait::async_trait;
use shop_orders_core::dataset::Dataset;
use shop_orders_core::{
    Delivery, DeliveryId, FlatJoin, FlatRow, Item, ItemId, Member, MemberId, Order, OrderId,
    OrderItem, OrderLineItem, OrderSearch, OrderStore, OrderSummary, OrderWithParties, Page,
    QueryError, ReadScope, Result,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// In-memory order store.
///
/// Cloning is cheap and clones share data, log and failure switch.
///
/// # Example
///
/// ```
/// use shop_orders_testing::InMemoryOrderStore;
/// use shop_orders_core::dataset::Dataset;
/// use shop_orders_core::{OrderStore, OrderSearch};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryOrderStore::with_dataset(Dataset::sample());
///
/// let mut scope = store.begin_read().await?;
/// let orders = scope.find_orders(&OrderSearch::default()).await?;
/// scope.close().await?;
///
/// assert_eq!(orders.len(), 2);
/// assert_eq!(store.query_log(), vec!["find_orders"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryOrderStore {
    data: Arc<RwLock<Dataset>>,
    log: Arc<Mutex<Vec<&'static str>>>,
    unavailable: Arc<AtomicBool>,
    scopes_opened: Arc<AtomicUsize>,
}

impl InMemoryOrderStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store serving the given dataset
    #[must_use]
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            data: Arc::new(RwLock::new(dataset)),
            ..Self::default()
        }
    }

    /// Swap the served dataset (for test isolation)
    pub fn replace_dataset(&self, dataset: Dataset) {
        if let Ok(mut data) = self.data.write() {
            *data = dataset;
        }
    }

    /// Make every subsequent scope open and query fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total round trips issued across all scopes
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.log.lock().map(|log| log.len()).unwrap_or_default()
    }

    /// Names of the issued queries, in order
    #[must_use]
    pub fn query_log(&self) -> Vec<&'static str> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// How many times a given query was issued
    #[must_use]
    pub fn count_of(&self, query: &str) -> usize {
        self.log
            .lock()
            .map(|log| log.iter().filter(|name| **name == query).count())
            .unwrap_or_default()
    }

    /// Forget recorded queries
    pub fn reset_log(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    /// Number of read scopes opened so far
    #[must_use]
    pub fn scopes_opened(&self) -> usize {
        self.scopes_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn begin_read(&self) -> Result<Box<dyn ReadScope>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueryError::unavailable("in-memory store switched off"));
        }
        self.scopes_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryReadScope {
            data: Arc::clone(&self.data),
            log: Arc::clone(&self.log),
            unavailable: Arc::clone(&self.unavailable),
            issued: 0,
            open: true,
        }))
    }

    async fn ping(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueryError::unavailable("in-memory store switched off"));
        }
        Ok(())
    }
}

/// Read scope over the shared dataset.
#[derive(Debug)]
pub struct InMemoryReadScope {
    data: Arc<RwLock<Dataset>>,
    log: Arc<Mutex<Vec<&'static str>>>,
    unavailable: Arc<AtomicBool>,
    issued: usize,
    open: bool,
}

impl InMemoryReadScope {
    /// Account for one round trip and hand out the dataset.
    fn query(&mut self, name: &'static str) -> Result<std::sync::RwLockReadGuard<'_, Dataset>> {
        if !self.open {
            return Err(QueryError::ScopeClosed);
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueryError::unavailable("in-memory store switched off"));
        }
        self.issued += 1;
        if let Ok(mut log) = self.log.lock() {
            log.push(name);
        }
        tracing::trace!(query = name, issued = self.issued, "In-memory query");
        self.data
            .read()
            .map_err(|_| QueryError::unavailable("dataset lock poisoned"))
    }
}

fn sorted_orders(data: &Dataset) -> Vec<&Order> {
    let mut orders: Vec<&Order> = data.orders().iter().collect();
    orders.sort_by_key(|o| o.id);
    orders
}

/// Inner join of an order with its member and delivery.
fn join_parties(data: &Dataset, order: &Order) -> Option<OrderWithParties> {
    let member = data.member(order.member_id)?;
    let delivery = data.delivery(order.delivery_id)?;
    Some(OrderWithParties {
        order: order.clone(),
        member: member.clone(),
        delivery: delivery.clone(),
    })
}

fn to_summary(joined: &OrderWithParties) -> OrderSummary {
    OrderSummary::new(
        joined.order.id,
        joined.member.name.clone(),
        joined.order.order_date,
        joined.order.status,
        joined.delivery.address.clone(),
    )
}

/// Line items joined with their catalogue item, in line-table order.
fn line_items(
    data: &Dataset,
    mut wanted: impl FnMut(&OrderItem) -> bool,
) -> Result<Vec<OrderLineItem>> {
    data.order_items()
        .iter()
        .filter(|line| wanted(*line))
        .map(|line| {
            let item = item_of(data, line)?;
            Ok(OrderLineItem::new(
                line.order_id,
                item.name.clone(),
                line.order_price,
                line.count,
            ))
        })
        .collect()
}

fn item_of<'a>(data: &'a Dataset, line: &OrderItem) -> Result<&'a Item> {
    data.item(line.item_id).ok_or(QueryError::DanglingReference {
        entity: "item",
        id: line.item_id.get(),
    })
}

#[async_trait]
impl ReadScope for InMemoryReadScope {
    async fn find_orders(&mut self, search: &OrderSearch) -> Result<Vec<Order>> {
        let data = self.query("find_orders")?;
        let mut found = Vec::new();
        for order in sorted_orders(&data) {
            let member = data.member(order.member_id).ok_or(QueryError::DanglingReference {
                entity: "member",
                id: order.member_id.get(),
            })?;
            if search.matches(&member.name, order.status) {
                found.push(order.clone());
            }
            if search.result_limit() == Some(found.len()) {
                break;
            }
        }
        Ok(found)
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Member> {
        let data = self.query("find_member")?;
        data.member(id).cloned().ok_or(QueryError::DanglingReference {
            entity: "member",
            id: id.get(),
        })
    }

    async fn find_delivery(&mut self, id: DeliveryId) -> Result<Delivery> {
        let data = self.query("find_delivery")?;
        data.delivery(id).cloned().ok_or(QueryError::DanglingReference {
            entity: "delivery",
            id: id.get(),
        })
    }

    async fn find_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let data = self.query("find_order_items")?;
        Ok(data
            .order_items()
            .iter()
            .filter(|line| line.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_order_items_in(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderItem>> {
        let data = self.query("find_order_items_in")?;
        let wanted: HashSet<OrderId> = order_ids.iter().copied().collect();
        Ok(data
            .order_items()
            .iter()
            .filter(|line| wanted.contains(&line.order_id))
            .cloned()
            .collect())
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Item> {
        let data = self.query("find_item")?;
        data.item(id).cloned().ok_or(QueryError::DanglingReference {
            entity: "item",
            id: id.get(),
        })
    }

    async fn find_items_in(&mut self, ids: &[ItemId]) -> Result<Vec<Item>> {
        let data = self.query("find_items_in")?;
        let wanted: HashSet<ItemId> = ids.iter().copied().collect();
        Ok(data
            .items()
            .iter()
            .filter(|item| wanted.contains(&item.id))
            .cloned()
            .collect())
    }

    async fn find_orders_with_member_delivery(
        &mut self,
        page: Option<Page>,
    ) -> Result<Vec<OrderWithParties>> {
        let data = self.query("find_orders_with_member_delivery")?;
        let joined: Vec<OrderWithParties> = sorted_orders(&data)
            .into_iter()
            .filter_map(|order| join_parties(&data, order))
            .collect();
        Ok(match page {
            Some(page) => page.slice(&joined).to_vec(),
            None => joined,
        })
    }

    async fn find_order_summaries(&mut self) -> Result<Vec<OrderSummary>> {
        let data = self.query("find_order_summaries")?;
        Ok(sorted_orders(&data)
            .into_iter()
            .filter_map(|order| join_parties(&data, order))
            .map(|joined| to_summary(&joined))
            .collect())
    }

    async fn find_line_items(&mut self, order_id: OrderId) -> Result<Vec<OrderLineItem>> {
        let data = self.query("find_line_items")?;
        let lines = line_items(&data, |line| line.order_id == order_id)?;
        Ok(lines)
    }

    async fn find_line_items_in(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderLineItem>> {
        let data = self.query("find_line_items_in")?;
        let wanted: HashSet<OrderId> = order_ids.iter().copied().collect();
        let lines = line_items(&data, |line| wanted.contains(&line.order_id))?;
        Ok(lines)
    }

    async fn find_flat_rows(&mut self, join: FlatJoin) -> Result<Vec<FlatRow>> {
        let data = self.query("find_flat_rows")?;

        // Natural row order follows the line table, so interleaved lines stay interleaved.
        let mut rows = Vec::new();
        let mut with_lines: HashSet<OrderId> = HashSet::new();
        for line in data.order_items() {
            let Some(order) = data.orders().iter().find(|o| o.id == line.order_id) else {
                continue;
            };
            let Some(joined) = join_parties(&data, order) else {
                continue;
            };
            let item = item_of(&data, line)?;
            with_lines.insert(order.id);
            rows.push(FlatRow {
                order_id: order.id,
                member_name: joined.member.name,
                order_date: order.order_date,
                status: order.status,
                address: joined.delivery.address,
                item_name: Some(item.name.clone()),
                order_price: Some(line.order_price),
                count: Some(line.count),
            });
        }

        if join == FlatJoin::LeftOuter {
            for order in sorted_orders(&data) {
                if with_lines.contains(&order.id) {
                    continue;
                }
                if let Some(joined) = join_parties(&data, order) {
                    rows.push(FlatRow {
                        order_id: order.id,
                        member_name: joined.member.name,
                        order_date: order.order_date,
                        status: order.status,
                        address: joined.delivery.address,
                        item_name: None,
                        order_price: None,
                        count: None,
                    });
                }
            }
        }

        Ok(rows)
    }

    fn queries_issued(&self) -> usize {
        self.issued
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_each_query_is_logged() {
        let store = InMemoryOrderStore::with_dataset(Dataset::sample());
        let mut scope = store.begin_read().await.unwrap();

        let orders = scope.find_orders(&OrderSearch::default()).await.unwrap();
        scope.find_member(orders[0].member_id).await.unwrap();

        assert_eq!(scope.queries_issued(), 2);
        assert_eq!(store.query_log(), vec!["find_orders", "find_member"]);
        assert_eq!(store.scopes_opened(), 1);
    }

    #[tokio::test]
    async fn test_closed_scope_rejects_queries() {
        let store = InMemoryOrderStore::with_dataset(Dataset::sample());
        let mut scope = store.begin_read().await.unwrap();
        scope.close().await.unwrap();

        let err = scope.find_member(MemberId::new(1)).await.unwrap_err();
        assert_eq!(err, QueryError::ScopeClosed);
        assert!(!scope.is_open());
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = InMemoryOrderStore::with_dataset(Dataset::sample());
        store.set_unavailable(true);

        assert!(matches!(
            store.begin_read().await.err(),
            Some(QueryError::StoreUnavailable(_))
        ));
        assert!(store.ping().await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_search_filters_by_member_name() {
        let store = InMemoryOrderStore::with_dataset(Dataset::sample());
        let mut scope = store.begin_read().await.unwrap();
        let search = OrderSearch {
            member_name: Some("B".to_string()),
            order_status: None,
        };

        let orders = scope.find_orders(&search).await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, OrderId::new(2));
    }

    #[tokio::test]
    async fn test_joined_fetch_respects_page() {
        let store = InMemoryOrderStore::with_dataset(fixtures::numbered_orders(5));
        let mut scope = store.begin_read().await.unwrap();

        let page = Page::new(3, 10).unwrap();
        let joined = scope.find_orders_with_member_delivery(Some(page)).await.unwrap();

        let ids: Vec<i64> = joined.iter().map(|j| j.order.id.get()).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_flat_rows_inner_vs_outer() {
        let store = InMemoryOrderStore::with_dataset(fixtures::three_orders_last_empty());
        let mut scope = store.begin_read().await.unwrap();

        let inner = scope.find_flat_rows(FlatJoin::Inner).await.unwrap();
        let outer = scope.find_flat_rows(FlatJoin::LeftOuter).await.unwrap();

        assert_eq!(inner.len(), 4);
        assert_eq!(outer.len(), 5);
        assert!(outer[4].item_name.is_none());
        assert_eq!(outer[4].order_id, OrderId::new(3));
    }

    #[tokio::test]
    async fn test_flat_rows_follow_line_table_order() {
        let store = InMemoryOrderStore::with_dataset(fixtures::interleaved_lines());
        let mut scope = store.begin_read().await.unwrap();

        let rows = scope.find_flat_rows(FlatJoin::Inner).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.order_id.get()).collect();

        assert_eq!(ids, vec![1, 2, 1, 2]);
    }

    #[tokio::test]
    async fn test_line_with_missing_item_is_dangling() {
        let mut data = Dataset::sample();
        let order = data.orders()[0].id;
        data.add_order_item(order, ItemId::new(99), 100, 1);
        let store = InMemoryOrderStore::with_dataset(data);
        let mut scope = store.begin_read().await.unwrap();
        let dangling = QueryError::DanglingReference {
            entity: "item",
            id: 99,
        };

        assert_eq!(scope.find_line_items(order).await.unwrap_err(), dangling);
        assert_eq!(scope.find_line_items_in(&[order]).await.unwrap_err(), dangling);
        assert_eq!(scope.find_flat_rows(FlatJoin::Inner).await.unwrap_err(), dangling);
        assert_eq!(scope.find_flat_rows(FlatJoin::LeftOuter).await.unwrap_err(), dangling);
    }

    #[tokio::test]
    async fn test_unfiltered_search_is_not_capped() {
        let data = fixtures::numbered_orders(OrderSearch::MAX_RESULTS + 1);
        let store = InMemoryOrderStore::with_dataset(data);
        let mut scope = store.begin_read().await.unwrap();
        let filtered = OrderSearch {
            order_status: Some(shop_orders_core::OrderStatus::Ordered),
            ..OrderSearch::default()
        };

        let all = scope.find_orders(&OrderSearch::default()).await.unwrap();
        let capped = scope.find_orders(&filtered).await.unwrap();

        assert_eq!(all.len(), OrderSearch::MAX_RESULTS + 1);
        assert_eq!(capped.len(), OrderSearch::MAX_RESULTS);
    }
}
