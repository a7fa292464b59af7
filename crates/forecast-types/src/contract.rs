//! Table shape and locator grammar shared by the store and the provider.
//!
//! Locators are hierarchical strings of the form
//! `content://<authority>/weather` (every record) and
//! `content://<authority>/weather/<date>` (the record for one day). This
//! module only builds and takes them apart; deciding which operation a
//! locator maps to is the router's job.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::date::{is_date_normalized, normalized_utc_date_at};
use crate::error::ParseError;

/// Scheme prefix of every locator.
pub const SCHEME: &str = "content://";

/// Authority used when no other is configured.
pub const DEFAULT_AUTHORITY: &str = "forecast.provider";

/// Path segment addressing the weather table.
pub const PATH_WEATHER: &str = "weather";

/// Name of the weather table.
pub const TABLE_NAME: &str = "weather";

/// Name of the synthetic row identifier column.
///
/// The row id only ever appears in ordering clauses; it is never projected.
pub const ROW_ID: &str = "_id";

/// Values below this that are not already a normalized millisecond date
/// are read as seconds when extracted from a locator. Corresponds to
/// 1973-03-03 in milliseconds and to the year 5138 in seconds.
pub const SECONDS_CUTOFF: i64 = 100_000_000_000;

/// A column of the weather table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Column {
    /// Normalized UTC day in milliseconds. Unique.
    Date,
    /// Weather condition code.
    WeatherId,
    /// Minimum temperature in degrees Celsius.
    MinTemp,
    /// Maximum temperature in degrees Celsius.
    MaxTemp,
    /// Relative humidity percentage.
    Humidity,
    /// Atmospheric pressure in hPa.
    Pressure,
    /// Wind speed.
    WindSpeed,
    /// Wind direction in meteorological degrees.
    Degrees,
}

impl Column {
    /// Every column, in table order.
    pub const ALL: [Column; 8] = [
        Column::Date,
        Column::WeatherId,
        Column::MinTemp,
        Column::MaxTemp,
        Column::Humidity,
        Column::Pressure,
        Column::WindSpeed,
        Column::Degrees,
    ];

    /// The six real-valued measurement columns.
    pub const MEASUREMENTS: [Column; 6] = [
        Column::MinTemp,
        Column::MaxTemp,
        Column::Humidity,
        Column::Pressure,
        Column::WindSpeed,
        Column::Degrees,
    ];

    /// Canonical SQL name of the column.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::WeatherId => "weather_id",
            Column::MinTemp => "min",
            Column::MaxTemp => "max",
            Column::Humidity => "humidity",
            Column::Pressure => "pressure",
            Column::WindSpeed => "wind",
            Column::Degrees => "degrees",
        }
    }

    /// Whether the column stores an integer (as opposed to a real).
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Column::Date | Column::WeatherId)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|column| column.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownColumn(s.to_string()))
    }
}

/// An opaque request key addressing data in the provider.
///
/// Construction never fails: a locator is just a string until the router
/// classifies it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Locator(String);

impl Locator {
    /// Wrap an arbitrary string.
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// The locator addressing every weather record under `authority`.
    ///
    /// ```
    /// use forecast_types::contract::Locator;
    ///
    /// let all = Locator::all_records("forecast.provider");
    /// assert_eq!(all.as_str(), "content://forecast.provider/weather");
    /// ```
    pub fn all_records(authority: &str) -> Self {
        Self(format!("{SCHEME}{authority}/{PATH_WEATHER}"))
    }

    /// The raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The authority component, if the locator carries the expected scheme.
    pub fn authority(&self) -> Option<&str> {
        let rest = self.0.strip_prefix(SCHEME)?;
        let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        Some(&rest[..end])
    }

    /// Non-empty path segments after the authority.
    ///
    /// Query strings and fragments are not part of the path. Returns an empty
    /// list when the scheme is missing.
    pub fn path_segments(&self) -> Vec<&str> {
        let Some(rest) = self.0.strip_prefix(SCHEME) else {
            return Vec::new();
        };
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        rest.split('/')
            .skip(1)
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    /// The final path segment, if any.
    pub fn last_path_segment(&self) -> Option<&str> {
        self.path_segments().pop()
    }

    /// Whether a change at `self` concerns an observer of `other`, or the
    /// other way around.
    ///
    /// Two locators are related when they share an authority and one path is
    /// a segment-wise prefix of the other.
    pub fn is_related_to(&self, other: &Locator) -> bool {
        if self.authority() != other.authority() {
            return false;
        }
        let ours = self.path_segments();
        let theirs = other.path_segments();
        let shared = ours.len().min(theirs.len());
        ours[..shared] == theirs[..shared]
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Locator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the locator addressing the record for `date` (milliseconds).
///
/// ```
/// use forecast_types::contract::{build_locator_for_date, date_from_locator};
///
/// let locator = build_locator_for_date("forecast.provider", 1_704_067_200_000);
/// assert_eq!(locator.as_str(), "content://forecast.provider/weather/1704067200000");
/// assert_eq!(date_from_locator(&locator), Some(1_704_067_200_000));
/// ```
pub fn build_locator_for_date(authority: &str, date: i64) -> Locator {
    Locator(format!("{SCHEME}{authority}/{PATH_WEATHER}/{date}"))
}

/// Extract the date embedded as the final path segment of `locator`.
///
/// The segment must be all ASCII digits. A normalized millisecond date is
/// returned unchanged, so this is the inverse of [`build_locator_for_date`]
/// for every stored date. Any other value below [`SECONDS_CUTOFF`] is taken
/// as seconds and widened to milliseconds.
pub fn date_from_locator(locator: &Locator) -> Option<i64> {
    let segment = locator.last_path_segment()?;
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = segment.parse().ok()?;
    if value < SECONDS_CUTOFF && !is_date_normalized(value) {
        value.checked_mul(1000)
    } else {
        Some(value)
    }
}

/// Predicate selecting today's record and everything after it, with the
/// value to bind to its single `?` placeholder.
///
/// Equivalent to `date >= <today's normalized midnight>`.
pub fn today_onwards_predicate() -> (String, i64) {
    today_onwards_predicate_at(OffsetDateTime::now_utc())
}

/// Like [`today_onwards_predicate`] with an explicit notion of "now".
pub fn today_onwards_predicate_at(now: OffsetDateTime) -> (String, i64) {
    (format!("{} >= ?", Column::Date), normalized_utc_date_at(now))
}
