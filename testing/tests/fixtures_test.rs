//! Fixture datasets behave as their docs promise when read through the store ports.

#![allow(clippy::unwrap_used)] // Test code can use unwrap

use shop_orders_core::{OrderSearch, OrderStore, OrderStatus, QueryError};
use shop_orders_testing::{InMemoryOrderStore, fixtures};

#[tokio::test]
async fn test_three_orders_last_empty() {
    let store = InMemoryOrderStore::with_dataset(fixtures::three_orders_last_empty());
    let mut scope = store.begin_read().await.unwrap();

    let summaries = scope.find_order_summaries().await.unwrap();
    let statuses: Vec<OrderStatus> = summaries.iter().map(|s| s.status).collect();
    assert_eq!(statuses, vec![OrderStatus::Ordered, OrderStatus::Canceled, OrderStatus::Ordered]);

    let ids: Vec<_> = summaries.iter().map(|s| s.order_id).collect();
    let lines = scope.find_line_items_in(&ids).await.unwrap();
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|line| line.order_id != ids[2]));

    scope.close().await.unwrap();
}

#[tokio::test]
async fn test_numbered_orders_have_sequential_ids() {
    let store = InMemoryOrderStore::with_dataset(fixtures::numbered_orders(5));
    let mut scope = store.begin_read().await.unwrap();

    let orders = scope.find_orders(&OrderSearch::default()).await.unwrap();

    let ids: Vec<i64> = orders.iter().map(|o| o.id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_many_items_are_distinct() {
    let store = InMemoryOrderStore::with_dataset(fixtures::many_items(7));
    let mut scope = store.begin_read().await.unwrap();

    let orders = scope.find_orders(&OrderSearch::default()).await.unwrap();
    let lines = scope.find_order_items(orders[0].id).await.unwrap();
    let mut item_ids: Vec<_> = lines.iter().map(|l| l.item_id).collect();
    item_ids.dedup();

    assert_eq!(orders.len(), 1);
    assert_eq!(item_ids.len(), 7);
}

#[tokio::test]
async fn test_replacing_dataset_is_visible_to_new_scopes() {
    let store = InMemoryOrderStore::new();
    store.replace_dataset(fixtures::numbered_orders(2));

    let mut scope = store.begin_read().await.unwrap();
    assert_eq!(scope.find_order_summaries().await.unwrap().len(), 2);

    scope.close().await.unwrap();
    let err = scope.find_order_summaries().await.unwrap_err();
    assert_eq!(err, QueryError::ScopeClosed);
}
