//! Read scope backed by a read-only `PostgreSQL` transaction.

use crate::rows::{
    DeliveryRow, FlatJoinRow, ItemRow, LineRow, MemberRow, OrderItemRow, OrderPartiesRow,
    OrderRow, SummaryRow, decode_all,
};
use crate::map_sqlx_error;
use async_trait::async_trait;
use shop_orders_core::{
    Delivery, DeliveryId, FlatJoin, FlatRow, Item, ItemId, Member, MemberId, Order, OrderId,
    OrderItem, OrderLineItem, OrderSearch, OrderSummary, OrderWithParties, Page, QueryError,
    ReadScope, Result,
};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

const ORDER_COLUMNS: &str = "o.order_id, o.member_id, o.delivery_id, o.order_date, o.status";

const SUMMARY_FROM: &str = r"
    SELECT o.order_id, m.name AS member_name, o.order_date, o.status,
           d.city, d.street, d.zipcode
    FROM orders o
    JOIN member m ON m.member_id = o.member_id
    JOIN delivery d ON d.delivery_id = o.delivery_id
";

const FLAT_INNER: &str = r"
    SELECT o.order_id, m.name AS member_name, o.order_date, o.status,
           d.city, d.street, d.zipcode,
           i.name AS item_name, oi.order_price, oi.count
    FROM orders o
    JOIN member m ON m.member_id = o.member_id
    JOIN delivery d ON d.delivery_id = o.delivery_id
    JOIN order_item oi ON oi.order_id = o.order_id
    JOIN item i ON i.item_id = oi.item_id
    ORDER BY oi.order_item_id
";

const FLAT_LEFT_OUTER: &str = r"
    SELECT o.order_id, m.name AS member_name, o.order_date, o.status,
           d.city, d.street, d.zipcode,
           i.name AS item_name, oi.order_price, oi.count
    FROM orders o
    JOIN member m ON m.member_id = o.member_id
    JOIN delivery d ON d.delivery_id = o.delivery_id
    LEFT JOIN order_item oi ON oi.order_id = o.order_id
    LEFT JOIN item i ON i.item_id = oi.item_id
    ORDER BY oi.order_item_id NULLS LAST, o.order_id
";

const LINE_ITEMS: &str = r"
    SELECT oi.order_id, i.name AS item_name, oi.order_price, oi.count
    FROM order_item oi
    JOIN item i ON i.item_id = oi.item_id
    WHERE oi.order_id = ANY($1)
    ORDER BY oi.order_item_id
";

/// Read scope over one read-only transaction.
///
/// Every query method is one round trip. Closing commits the transaction;
/// dropping an open scope rolls it back.
pub struct PostgresReadScope {
    tx: Option<Transaction<'static, Postgres>>,
    issued: usize,
}

impl PostgresReadScope {
    /// Begin a read-only transaction on the pool.
    pub(crate) async fn begin(pool: &PgPool) -> Result<Self> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin read transaction", e))?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set transaction read only", e))?;

        Ok(Self {
            tx: Some(tx),
            issued: 0,
        })
    }

    /// Account for one round trip and hand out the transaction connection.
    fn conn(&mut self, query: &'static str) -> Result<&mut PgConnection> {
        let tx = self.tx.as_mut().ok_or(QueryError::ScopeClosed)?;
        self.issued += 1;
        metrics::counter!("orders_store.postgres.queries", "query" => query).increment(1);
        tracing::trace!(query, issued = self.issued, "Postgres query");
        Ok(&mut **tx)
    }
}

fn raw_ids<T: Copy>(ids: &[T], get: impl Fn(T) -> i64) -> Vec<i64> {
    ids.iter().copied().map(get).collect()
}

#[async_trait]
impl ReadScope for PostgresReadScope {
    async fn find_orders(&mut self, search: &OrderSearch) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}
             FROM orders o
             JOIN member m ON m.member_id = o.member_id
             WHERE ($1::text IS NULL OR strpos(m.name, $1) > 0)
               AND ($2::text IS NULL OR o.status = $2)
             ORDER BY o.order_id
             LIMIT $3"
        );
        // LIMIT NULL is LIMIT ALL, so an unfiltered search is unbounded.
        let limit = search
            .result_limit()
            .map(|cap| i64::try_from(cap).unwrap_or(i64::MAX));
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(search.member_name.as_deref())
            .bind(search.order_status.map(|s| s.as_str()))
            .bind(limit)
            .fetch_all(self.conn("find_orders")?)
            .await
            .map_err(|e| map_sqlx_error("find orders", e))?;
        decode_all(rows)
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Member> {
        let row: Option<MemberRow> = sqlx::query_as(
            "SELECT member_id, name, city, street, zipcode FROM member WHERE member_id = $1",
        )
        .bind(id.get())
        .fetch_optional(self.conn("find_member")?)
        .await
        .map_err(|e| map_sqlx_error("find member", e))?;

        row.map(Member::from).ok_or(QueryError::DanglingReference {
            entity: "member",
            id: id.get(),
        })
    }

    async fn find_delivery(&mut self, id: DeliveryId) -> Result<Delivery> {
        let row: Option<DeliveryRow> = sqlx::query_as(
            "SELECT delivery_id, city, street, zipcode, status FROM delivery WHERE delivery_id = $1",
        )
        .bind(id.get())
        .fetch_optional(self.conn("find_delivery")?)
        .await
        .map_err(|e| map_sqlx_error("find delivery", e))?;

        row.ok_or(QueryError::DanglingReference {
            entity: "delivery",
            id: id.get(),
        })?
        .try_into()
    }

    async fn find_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT order_item_id, order_id, item_id, order_price, count
            FROM order_item
            WHERE order_id = $1
            ORDER BY order_item_id
            ",
        )
        .bind(order_id.get())
        .fetch_all(self.conn("find_order_items")?)
        .await
        .map_err(|e| map_sqlx_error("find order items", e))?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn find_order_items_in(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT order_item_id, order_id, item_id, order_price, count
            FROM order_item
            WHERE order_id = ANY($1)
            ORDER BY order_item_id
            ",
        )
        .bind(raw_ids(order_ids, OrderId::get))
        .fetch_all(self.conn("find_order_items_in")?)
        .await
        .map_err(|e| map_sqlx_error("find order items in batch", e))?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Item> {
        let row: Option<ItemRow> = sqlx::query_as(
            "SELECT item_id, name, price, stock_quantity FROM item WHERE item_id = $1",
        )
        .bind(id.get())
        .fetch_optional(self.conn("find_item")?)
        .await
        .map_err(|e| map_sqlx_error("find item", e))?;

        row.map(Item::from).ok_or(QueryError::DanglingReference {
            entity: "item",
            id: id.get(),
        })
    }

    async fn find_items_in(&mut self, ids: &[ItemId]) -> Result<Vec<Item>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r"
            SELECT item_id, name, price, stock_quantity
            FROM item
            WHERE item_id = ANY($1)
            ORDER BY item_id
            ",
        )
        .bind(raw_ids(ids, ItemId::get))
        .fetch_all(self.conn("find_items_in")?)
        .await
        .map_err(|e| map_sqlx_error("find items in batch", e))?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn find_orders_with_member_delivery(
        &mut self,
        page: Option<Page>,
    ) -> Result<Vec<OrderWithParties>> {
        // LIMIT NULL is LIMIT ALL in PostgreSQL.
        let (offset, limit) = page.map_or((0, None), |p| (p.offset(), Some(p.limit())));
        let sql = format!(
            "SELECT {ORDER_COLUMNS},
                    m.name AS member_name, m.city AS member_city,
                    m.street AS member_street, m.zipcode AS member_zipcode,
                    d.city AS delivery_city, d.street AS delivery_street,
                    d.zipcode AS delivery_zipcode, d.status AS delivery_status
             FROM orders o
             JOIN member m ON m.member_id = o.member_id
             JOIN delivery d ON d.delivery_id = o.delivery_id
             ORDER BY o.order_id
             OFFSET $1 LIMIT $2"
        );
        let rows: Vec<OrderPartiesRow> = sqlx::query_as(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(self.conn("find_orders_with_member_delivery")?)
            .await
            .map_err(|e| map_sqlx_error("find orders with member and delivery", e))?;
        decode_all(rows)
    }

    async fn find_order_summaries(&mut self) -> Result<Vec<OrderSummary>> {
        let sql = format!("{SUMMARY_FROM} ORDER BY o.order_id");
        let rows: Vec<SummaryRow> = sqlx::query_as(&sql)
            .fetch_all(self.conn("find_order_summaries")?)
            .await
            .map_err(|e| map_sqlx_error("find order summaries", e))?;
        decode_all(rows)
    }

    async fn find_line_items(&mut self, order_id: OrderId) -> Result<Vec<OrderLineItem>> {
        let rows: Vec<LineRow> = sqlx::query_as(LINE_ITEMS)
            .bind(vec![order_id.get()])
            .fetch_all(self.conn("find_line_items")?)
            .await
            .map_err(|e| map_sqlx_error("find line items", e))?;
        Ok(rows.into_iter().map(OrderLineItem::from).collect())
    }

    async fn find_line_items_in(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderLineItem>> {
        let rows: Vec<LineRow> = sqlx::query_as(LINE_ITEMS)
            .bind(raw_ids(order_ids, OrderId::get))
            .fetch_all(self.conn("find_line_items_in")?)
            .await
            .map_err(|e| map_sqlx_error("find line items in batch", e))?;
        Ok(rows.into_iter().map(OrderLineItem::from).collect())
    }

    async fn find_flat_rows(&mut self, join: FlatJoin) -> Result<Vec<FlatRow>> {
        let sql = match join {
            FlatJoin::Inner => FLAT_INNER,
            FlatJoin::LeftOuter => FLAT_LEFT_OUTER,
        };
        let rows: Vec<FlatJoinRow> = sqlx::query_as(sql)
            .fetch_all(self.conn("find_flat_rows")?)
            .await
            .map_err(|e| map_sqlx_error("find flat rows", e))?;
        decode_all(rows)
    }

    fn queries_issued(&self) -> usize {
        self.issued
    }

    fn is_open(&self) -> bool {
        self.tx.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| map_sqlx_error("commit read transaction", e))?;
        }
        Ok(())
    }
}
