//! Order aggregation service: one listing, six ways of fetching it.
//!
//! | Strategy | Round trips (N orders, M distinct items) |
//! |---|---|
//! | [`Strategy::NaiveProjection`] | `1 + 3N + M` |
//! | [`Strategy::LazyDto`] | `1 + 3N + M` |
//! | [`Strategy::JoinedFetch`] | `1 + ceil(N/b) + ceil(M/b)` with batch size `b`, else `1 + N + M` |
//! | [`Strategy::PagedJoinedFetch`] | as above, over one page |
//! | [`Strategy::PerFieldProjection`] | `1 + N` |
//! | [`Strategy::BatchedProjection`] | `2` (`1` when there are no orders) |
//! | [`Strategy::FlatProjection`] | `1` |
//!
//! Each call opens one read scope, runs its queries sequentially, and closes
//! the scope before returning. Round trips are logged and recorded as the
//! `orders_api.query.round_trips` histogram.

pub mod assembler;

use assembler::{
    ItemCache, attach_lines_batched, attach_lines_per_order, materialize, summarize_lazily,
};
use shop_orders_core::grouping::{attach_line_items, group_by_order, regroup};
use shop_orders_core::{
    FlatJoin, OrderId, OrderSearch, OrderStore, OrderSummary, OrderWithParties, Page, ReadScope,
    Result,
};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Data-fetching strategy behind one endpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// v1: load entities, resolve every association, then map
    NaiveProjection,
    /// v2: resolve associations while building each summary
    LazyDto,
    /// v3: orders joined with member and delivery, lines resolved afterwards
    JoinedFetch,
    /// v3.1: joined fetch over an offset/limit window
    PagedJoinedFetch,
    /// v4: summary projection, then line items per order
    PerFieldProjection,
    /// v5: summary projection, then all line items in one query
    BatchedProjection,
    /// v6: one flat join, regrouped in memory
    FlatProjection,
}

impl Strategy {
    /// Every strategy, in endpoint order
    pub const ALL: [Self; 7] = [
        Self::NaiveProjection,
        Self::LazyDto,
        Self::JoinedFetch,
        Self::PagedJoinedFetch,
        Self::PerFieldProjection,
        Self::BatchedProjection,
        Self::FlatProjection,
    ];

    /// Endpoint version label (`v1` .. `v6`)
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NaiveProjection => "v1",
            Self::LazyDto => "v2",
            Self::JoinedFetch => "v3",
            Self::PagedJoinedFetch => "v3.1",
            Self::PerFieldProjection => "v4",
            Self::BatchedProjection => "v5",
            Self::FlatProjection => "v6",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning knobs for the strategies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QuerySettings {
    /// Ids per `IN` query for v3/v3.1 line resolution; `None` resolves per order
    pub batch_fetch_size: Option<NonZeroUsize>,
    /// Join policy of the v6 flat query
    pub flat_join: FlatJoin,
}

impl QuerySettings {
    /// Default batch size
    pub const DEFAULT_BATCH_FETCH_SIZE: usize = 100;
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            batch_fetch_size: NonZeroUsize::new(Self::DEFAULT_BATCH_FETCH_SIZE),
            flat_join: FlatJoin::default(),
        }
    }
}

/// Produces order summaries under each strategy.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use orders_api::service::{OrderAggregationService, QuerySettings};
/// use shop_orders_core::dataset::Dataset;
/// use shop_orders_testing::InMemoryOrderStore;
///
/// # async fn example() -> shop_orders_core::Result<()> {
/// let store = InMemoryOrderStore::with_dataset(Dataset::sample());
/// let service = OrderAggregationService::new(Arc::new(store.clone()), QuerySettings::default());
///
/// let orders = service.flat_projection().await?;
/// assert_eq!(orders.len(), 2);
/// assert_eq!(store.query_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OrderAggregationService {
    store: Arc<dyn OrderStore>,
    settings: QuerySettings,
}

impl fmt::Debug for OrderAggregationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderAggregationService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl OrderAggregationService {
    /// Create a service over a store.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, settings: QuerySettings) -> Self {
        Self { store, settings }
    }

    /// Active settings
    #[must_use]
    pub const fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// v1: entity search, full materialization, then pure mapping.
    ///
    /// # Errors
    ///
    /// [`QueryError::StoreUnavailable`](shop_orders_core::QueryError::StoreUnavailable)
    /// if the store fails; data-integrity errors if a reference dangles.
    pub async fn naive_projection(&self, search: &OrderSearch) -> Result<Vec<OrderSummary>> {
        let strategy = Strategy::NaiveProjection;
        let mut scope = self.open(strategy).await?;
        let result: Result<Vec<OrderSummary>> = async {
            let orders = scope.find_orders(search).await?;
            let aggregates = materialize(scope.as_mut(), orders, &mut ItemCache::new()).await?;
            Ok(aggregates.iter().map(OrderSummary::from).collect())
        }
        .await;
        self.finish(strategy, scope, result).await
    }

    /// v2: entity search, associations resolved while shaping each summary.
    ///
    /// # Errors
    ///
    /// As [`Self::naive_projection`].
    pub async fn lazy_dto(&self, search: &OrderSearch) -> Result<Vec<OrderSummary>> {
        let strategy = Strategy::LazyDto;
        let mut scope = self.open(strategy).await?;
        let result: Result<Vec<OrderSummary>> = async {
            let orders = scope.find_orders(search).await?;
            summarize_lazily(scope.as_mut(), orders, &mut ItemCache::new()).await
        }
        .await;
        self.finish(strategy, scope, result).await
    }

    /// v3: orders joined with member and delivery, then line resolution.
    ///
    /// # Errors
    ///
    /// As [`Self::naive_projection`].
    pub async fn joined_fetch(&self) -> Result<Vec<OrderSummary>> {
        let strategy = Strategy::JoinedFetch;
        let mut scope = self.open(strategy).await?;
        let result: Result<Vec<OrderSummary>> = async {
            let joined = scope.find_orders_with_member_delivery(None).await?;
            self.attach_lines(scope.as_mut(), joined).await
        }
        .await;
        self.finish(strategy, scope, result).await
    }

    /// v3.1: joined fetch over `[offset, offset + limit)` by order id.
    ///
    /// # Errors
    ///
    /// [`QueryError::InvalidArgument`](shop_orders_core::QueryError::InvalidArgument)
    /// for `offset < 0` or `limit <= 0`, raised before the store is touched.
    pub async fn paged_joined_fetch(&self, offset: i64, limit: i64) -> Result<Vec<OrderSummary>> {
        let strategy = Strategy::PagedJoinedFetch;
        let page = Page::new(offset, limit).inspect_err(|err| {
            tracing::debug!(strategy = %strategy, offset, limit, error = %err, "Rejected page");
        })?;
        let mut scope = self.open(strategy).await?;
        let result: Result<Vec<OrderSummary>> = async {
            let joined = scope.find_orders_with_member_delivery(Some(page)).await?;
            self.attach_lines(scope.as_mut(), joined).await
        }
        .await;
        self.finish(strategy, scope, result).await
    }

    /// v4: summary projection, then one line-item query per order.
    ///
    /// # Errors
    ///
    /// [`QueryError::StoreUnavailable`](shop_orders_core::QueryError::StoreUnavailable)
    /// if the store fails.
    pub async fn per_field_projection(&self) -> Result<Vec<OrderSummary>> {
        let strategy = Strategy::PerFieldProjection;
        let mut scope = self.open(strategy).await?;
        let result: Result<Vec<OrderSummary>> = async {
            let summaries = scope.find_order_summaries().await?;
            let mut filled = Vec::with_capacity(summaries.len());
            for summary in summaries {
                let lines = scope.find_line_items(summary.order_id).await?;
                filled.push(summary.with_items(lines));
            }
            Ok(filled)
        }
        .await;
        self.finish(strategy, scope, result).await
    }

    /// v5: summary projection, then every line item in one `IN` query.
    ///
    /// # Errors
    ///
    /// As [`Self::per_field_projection`].
    pub async fn batched_projection(&self) -> Result<Vec<OrderSummary>> {
        let strategy = Strategy::BatchedProjection;
        let mut scope = self.open(strategy).await?;
        let result: Result<Vec<OrderSummary>> = async {
            let summaries = scope.find_order_summaries().await?;
            if summaries.is_empty() {
                return Ok(summaries);
            }
            let ids: Vec<OrderId> = summaries.iter().map(|s| s.order_id).collect();
            let lines = scope.find_line_items_in(&ids).await?;
            Ok(attach_line_items(summaries, group_by_order(lines)))
        }
        .await;
        self.finish(strategy, scope, result).await
    }

    /// v6: one flat join regrouped in memory. Never paged.
    ///
    /// # Errors
    ///
    /// As [`Self::per_field_projection`].
    pub async fn flat_projection(&self) -> Result<Vec<OrderSummary>> {
        let strategy = Strategy::FlatProjection;
        let mut scope = self.open(strategy).await?;
        let result: Result<Vec<OrderSummary>> = async {
            let rows = scope.find_flat_rows(self.settings.flat_join).await?;
            Ok(regroup(rows))
        }
        .await;
        self.finish(strategy, scope, result).await
    }

    /// Run a strategy by value; v3.1 uses the default page.
    ///
    /// # Errors
    ///
    /// Whatever the selected strategy returns.
    pub async fn list(&self, strategy: Strategy) -> Result<Vec<OrderSummary>> {
        let search = OrderSearch::default();
        match strategy {
            Strategy::NaiveProjection => self.naive_projection(&search).await,
            Strategy::LazyDto => self.lazy_dto(&search).await,
            Strategy::JoinedFetch => self.joined_fetch().await,
            Strategy::PagedJoinedFetch => {
                self.paged_joined_fetch(Page::DEFAULT_OFFSET, Page::DEFAULT_LIMIT)
                    .await
            }
            Strategy::PerFieldProjection => self.per_field_projection().await,
            Strategy::BatchedProjection => self.batched_projection().await,
            Strategy::FlatProjection => self.flat_projection().await,
        }
    }

    async fn attach_lines(
        &self,
        scope: &mut dyn ReadScope,
        joined: Vec<OrderWithParties>,
    ) -> Result<Vec<OrderSummary>> {
        let mut cache = ItemCache::new();
        match self.settings.batch_fetch_size {
            Some(batch) => attach_lines_batched(scope, joined, batch, &mut cache).await,
            None => attach_lines_per_order(scope, joined, &mut cache).await,
        }
    }

    async fn open(&self, strategy: Strategy) -> Result<Box<dyn ReadScope>> {
        self.store.begin_read().await.inspect_err(|err| {
            tracing::warn!(strategy = %strategy, error = %err, "Failed to open read scope");
            metrics::counter!("orders_api.query.failures", "strategy" => strategy.as_str())
                .increment(1);
        })
    }

    /// Close the scope, record round trips, and hand back the strategy result.
    async fn finish(
        &self,
        strategy: Strategy,
        mut scope: Box<dyn ReadScope>,
        result: Result<Vec<OrderSummary>>,
    ) -> Result<Vec<OrderSummary>> {
        let round_trips = scope.queries_issued();
        let closed = scope.close().await;

        metrics::counter!("orders_api.query.requests", "strategy" => strategy.as_str())
            .increment(1);
        metrics::histogram!("orders_api.query.round_trips", "strategy" => strategy.as_str())
            .record(u32::try_from(round_trips).map_or(f64::from(u32::MAX), f64::from));

        match result.and_then(|orders| closed.map(|()| orders)) {
            Ok(orders) => {
                tracing::info!(
                    strategy = %strategy,
                    orders = orders.len(),
                    round_trips,
                    "Orders listed"
                );
                Ok(orders)
            }
            Err(err) => {
                tracing::warn!(strategy = %strategy, round_trips, error = %err, "Order listing failed");
                metrics::counter!("orders_api.query.failures", "strategy" => strategy.as_str())
                    .increment(1);
                Err(err)
            }
        }
    }
}
