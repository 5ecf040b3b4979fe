//! Response envelope wrapping every listing with count and timestamp metadata.
//!
//! ```json
//! { "count": 2, "date": "2025-01-01-Wed 09:00:00", "data": [ ... ] }
//! ```

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Serialize, Serializer};
use shop_orders_core::environment::Clock;

/// Envelope date pattern: `2025-01-01-Wed 09:00:00`.
pub const DATE_FORMAT: &str = "%Y-%m-%d-%a %H:%M:%S";

/// Offset used when none is configured: UTC+09:00.
pub const DEFAULT_UTC_OFFSET_SECONDS: i32 = 9 * 3600;

/// `{ count, date, data }` envelope.
///
/// `count` and `date` are fixed when the envelope is built.
///
/// # Example
///
/// ```
/// use chrono::{FixedOffset, TimeZone};
/// use shop_orders_web::ResultEnvelope;
///
/// let date = FixedOffset::east_opt(9 * 3600).unwrap()
///     .with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
/// let envelope = ResultEnvelope::of_list(vec!["a", "b"], date);
///
/// assert_eq!(envelope.count(), 2);
/// assert_eq!(envelope.formatted_date(), "2025-01-01-Wed 09:00:00");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope<T> {
    count: usize,
    #[serde(serialize_with = "serialize_date")]
    date: DateTime<FixedOffset>,
    data: T,
}

impl<T> ResultEnvelope<Vec<T>> {
    /// Wrap a sequence; `count` is its length.
    #[must_use]
    pub fn of_list(data: Vec<T>, date: DateTime<FixedOffset>) -> Self {
        Self {
            count: data.len(),
            date,
            data,
        }
    }
}

impl<T> ResultEnvelope<T> {
    /// Wrap a single value; `count` is 1.
    #[must_use]
    pub const fn of_one(data: T, date: DateTime<FixedOffset>) -> Self {
        Self {
            count: 1,
            date,
            data,
        }
    }

    /// Cardinality recorded at construction
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Date as rendered on the wire
    #[must_use]
    pub fn formatted_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Wrapped payload
    #[must_use]
    pub const fn data(&self) -> &T {
        &self.data
    }

    /// Unwrap the payload
    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: Serialize> IntoResponse for ResultEnvelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Current time from `clock`, shifted into `offset`.
#[must_use]
pub fn now_in(clock: &dyn Clock, offset: FixedOffset) -> DateTime<FixedOffset> {
    clock.now().with_timezone(&offset)
}

/// Build an offset from seconds east of UTC, falling back to +09:00 when out of range.
#[must_use]
pub fn utc_offset(seconds: i32) -> FixedOffset {
    FixedOffset::east_opt(seconds)
        .or_else(|| FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECONDS))
        .unwrap_or_else(|| Utc.fix())
}

fn serialize_date<S: Serializer>(
    date: &DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}
