//! Datasets for common test scenarios.

use chrono::{NaiveDate, NaiveDateTime};
use shop_orders_core::dataset::Dataset;
use shop_orders_core::{Address, OrderStatus};

/// Order date used by the fixtures: 2025-01-{day} 12:00:00.
#[must_use]
pub fn date(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

/// Three orders by three members; orders 1 and 2 have two lines, order 3 none.
#[must_use]
pub fn three_orders_last_empty() -> Dataset {
    let mut data = Dataset::new();
    let book = data.add_item("BOOK", 10000, 100);
    let pen = data.add_item("PEN", 1000, 100);

    let kim = data.add_member("kim", Address::new("Seoul", "1", "1111"));
    let lee = data.add_member("lee", Address::new("Busan", "2", "2222"));
    let park = data.add_member("park", Address::new("Jinju", "3", "3333"));

    data.add_order(kim, date(1), OrderStatus::Ordered, &[(book, 10000, 1), (pen, 1000, 2)]);
    data.add_order(lee, date(2), OrderStatus::Canceled, &[(book, 9000, 3), (pen, 900, 4)]);
    data.add_order(park, date(3), OrderStatus::Ordered, &[]);
    data
}

/// Two orders whose lines were stored alternately: 1, 2, 1, 2.
#[must_use]
pub fn interleaved_lines() -> Dataset {
    let mut data = Dataset::new();
    let a = data.add_item("A", 100, 10);
    let b = data.add_item("B", 200, 10);
    let x = data.add_item("X", 300, 10);
    let y = data.add_item("Y", 400, 10);

    let first = data.add_member("first", Address::new("Seoul", "1", "1111"));
    let second = data.add_member("second", Address::new("Daegu", "4", "4444"));
    let one = data.add_order(first, date(1), OrderStatus::Ordered, &[]);
    let two = data.add_order(second, date(2), OrderStatus::Ordered, &[]);

    data.add_order_item(one, a, 100, 1);
    data.add_order_item(two, x, 300, 1);
    data.add_order_item(one, b, 200, 2);
    data.add_order_item(two, y, 400, 2);
    data
}

/// `count` orders, each by its own member with one line, ids 1..=count.
#[must_use]
pub fn numbered_orders(count: usize) -> Dataset {
    let mut data = Dataset::new();
    let item = data.add_item("ITEM", 500, 1000);
    for n in 1..=count {
        let member = data.add_member(
            format!("member-{n}"),
            Address::new("Seoul", format!("street-{n}"), "1000"),
        );
        let day = u32::try_from(n % 28).map_or(1, |d| d + 1);
        let qty = i32::try_from(n).unwrap_or(i32::MAX);
        data.add_order(member, date(day), OrderStatus::Ordered, &[(item, 500, qty)]);
    }
    data
}

/// Orders whose lines reference `count` distinct items, for batch fetch tests.
#[must_use]
pub fn many_items(count: usize) -> Dataset {
    let mut data = Dataset::new();
    let member = data.add_member("bulk", Address::new("Seoul", "7", "7777"));
    let order = data.add_order(member, date(5), OrderStatus::Ordered, &[]);
    for n in 0..count {
        let price = i32::try_from(n).map_or(i32::MAX, |p| 100 + p);
        let item = data.add_item(format!("ITEM-{n}"), price, 10);
        data.add_order_item(order, item, price, 1);
    }
    data
}
