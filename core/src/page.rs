//! Offset/limit paging over orders.

use crate::error::{QueryError, Result};
use serde::Serialize;

/// A validated window over an order list sorted by order id ascending.
///
/// Consecutive windows `[0, L)`, `[L, 2L)`, ... over an unchanged dataset are
/// disjoint and together cover every order exactly once.
///
/// # Example
///
/// ```
/// use shop_orders_core::Page;
///
/// let page = Page::new(20, 10)?;
/// assert_eq!(page.offset(), 20);
/// assert!(Page::new(0, 0).is_err());
/// # Ok::<(), shop_orders_core::QueryError>(())
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    offset: i64,
    limit: i64,
}

impl Page {
    /// Offset used when the client omits one
    pub const DEFAULT_OFFSET: i64 = 0;

    /// Limit used when the client omits one
    pub const DEFAULT_LIMIT: i64 = 100;

    /// Validate and build a page.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] if `offset < 0` or `limit <= 0`.
    pub fn new(offset: i64, limit: i64) -> Result<Self> {
        if offset < 0 {
            return Err(QueryError::invalid_argument(format!(
                "offset must not be negative, got {offset}"
            )));
        }
        if limit <= 0 {
            return Err(QueryError::invalid_argument(format!(
                "limit must be greater than 0, got {limit}"
            )));
        }
        Ok(Self { offset, limit })
    }

    /// Number of orders skipped
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    /// Maximum number of orders returned
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    /// Apply the window to an already sorted slice.
    #[must_use]
    pub fn slice<'a, T>(&self, sorted: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(sorted.len());
        let len = usize::try_from(self.limit).unwrap_or(usize::MAX);
        let end = start.saturating_add(len).min(sorted.len());
        &sorted[start..end]
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: Self::DEFAULT_OFFSET,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_negative_offset() {
        let err = Page::new(-1, 10).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_non_positive_limit() {
        assert!(matches!(Page::new(0, 0), Err(QueryError::InvalidArgument(_))));
        assert!(matches!(Page::new(0, -5), Err(QueryError::InvalidArgument(_))));
    }

    #[test]
    fn test_default_window() {
        let page = Page::default();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 100);
    }

    #[test]
    fn test_slice_past_end_is_empty() {
        let data = [1, 2, 3];
        assert!(Page::new(5, 2).unwrap().slice(&data).is_empty());
        assert_eq!(Page::new(2, 2).unwrap().slice(&data), &[3]);
    }

    proptest! {
        #[test]
        fn pages_concatenate_to_full_list(len in 0usize..40, limit in 1i64..9) {
            let data: Vec<usize> = (0..len).collect();
            let mut collected = Vec::new();
            let mut offset = 0;
            loop {
                let page = Page::new(offset, limit).unwrap();
                let chunk = page.slice(&data);
                if chunk.is_empty() {
                    break;
                }
                collected.extend_from_slice(chunk);
                offset += limit;
            }
            prop_assert_eq!(collected, data);
        }
    }
}
