//! Date normalization for forecast records.
//!
//! Every stored record is keyed by the start of its UTC calendar day,
//! expressed in milliseconds since the Unix epoch. The same rule is used
//! when validating inserts and when building the "today onward" predicate,
//! so a row written by a sync is always visible to the list query.

use time::OffsetDateTime;

/// Milliseconds in one day.
pub const DAY_IN_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Truncate a millisecond timestamp to the start of its UTC day.
///
/// Negative timestamps (before 1970) round towards negative infinity, so
/// the result is never later than the input.
///
/// # Examples
///
/// ```
/// use forecast_types::date::{normalize_date, DAY_IN_MILLIS};
///
/// assert_eq!(normalize_date(DAY_IN_MILLIS + 1), DAY_IN_MILLIS);
/// assert_eq!(normalize_date(-1), -DAY_IN_MILLIS);
/// ```
#[must_use]
pub fn normalize_date(millis: i64) -> i64 {
    millis.saturating_sub(millis.rem_euclid(DAY_IN_MILLIS))
}

/// Check whether a millisecond timestamp is the start of a UTC day.
#[must_use]
pub fn is_date_normalized(millis: i64) -> bool {
    millis.rem_euclid(DAY_IN_MILLIS) == 0
}

/// The normalized date for the current UTC day.
#[must_use]
pub fn normalized_utc_date_for_today() -> i64 {
    normalized_utc_date_at(OffsetDateTime::now_utc())
}

/// The normalized date for the UTC day containing `instant`.
#[must_use]
pub fn normalized_utc_date_at(instant: OffsetDateTime) -> i64 {
    normalize_date(to_millis(instant))
}

/// Convert an instant to milliseconds since the epoch, rounding towards
/// negative infinity.
#[must_use]
pub fn to_millis(instant: OffsetDateTime) -> i64 {
    instant.unix_timestamp_nanos().div_euclid(1_000_000) as i64
}

/// Convert milliseconds since the epoch to an instant.
///
/// Returns `None` if the value is outside the range `time` can represent.
#[must_use]
pub fn from_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}
