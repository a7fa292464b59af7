//! Record types and data contract for the forecast data provider.
//!
//! This crate holds everything that is purely definitional: the shape of a
//! forecast record, the date normalization rule, the table and column names,
//! and the locator grammar. It has no storage or I/O dependencies and is
//! shared by `forecast-store` and `forecast-core`.
//!
//! # Example
//!
//! ```
//! use forecast_types::{WeatherRecord, contract::build_locator_for_date, date::normalize_date};
//!
//! let record = WeatherRecord::builder()
//!     .date(normalize_date(1_704_110_400_250))
//!     .weather_condition_id(800)
//!     .temperatures(3.5, 9.0)
//!     .humidity(71.0)
//!     .pressure(1016.0)
//!     .wind(4.2, 230.0)
//!     .build()?;
//! record.validate()?;
//!
//! let locator = build_locator_for_date("forecast.provider", record.date);
//! assert_eq!(locator.as_str(), "content://forecast.provider/weather/1704067200000");
//! # Ok::<(), forecast_types::RecordError>(())
//! ```

pub mod contract;
pub mod date;
pub mod error;
pub mod types;

pub use contract::{Column, Locator};
pub use error::{ParseError, ParseResult, RecordError};
pub use types::{WeatherRecord, WeatherRecordBuilder};
