//! # Shop Orders Testing
//!
//! Testing utilities for the shop order read API.
//!
//! This crate provides:
//! - An in-memory [`OrderStore`](shop_orders_core::OrderStore) with a query log
//!   and failure injection
//! - A fixed clock for reproducible response envelopes
//! - Ready-made datasets for the common scenarios
//!
//! ## Example
//!
//! ```
//! use shop_orders_testing::{fixtures, InMemoryOrderStore};
//!
//! let store = InMemoryOrderStore::with_dataset(fixtures::three_orders_last_empty());
//! assert_eq!(store.query_count(), 0);
//! ```

use chrono::{DateTime, Utc};
use shop_orders_core::environment::Clock;

pub mod fixtures;
pub mod in_memory;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making envelope dates reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use shop_orders_testing::mocks::FixedClock;
    /// use shop_orders_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use in_memory::{InMemoryOrderStore, InMemoryReadScope};
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().timestamp(), 1_735_689_600);
    }
}
