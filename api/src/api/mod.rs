//! API endpoints for the orders service.

pub mod orders;

pub use orders::{
    OrderListing, PageParams, list_orders_v1, list_orders_v2, list_orders_v3, list_orders_v3_1,
    list_orders_v4, list_orders_v5, list_orders_v6,
};
