//! Local persistence for daily forecast records.
//!
//! This crate provides SQLite-based storage for the forecast cache: a single
//! `weather` table keyed by normalized UTC day, where inserting a day that is
//! already stored replaces the old row.
//!
//! # Features
//!
//! - One table, one row per day, upsert enforced by the schema
//! - Caller-supplied predicates with positional arguments
//! - Typed projections and ordering, immutable result sets
//! - All-or-nothing batch writes
//! - Drop-and-recreate schema upgrades
//!
//! # Example
//!
//! ```no_run
//! use forecast_store::{Selection, SortOrder, Store};
//!
//! let store = Store::open_default()?;
//!
//! let upcoming = store.query(None, &Selection::today_onwards(), &SortOrder::date_ascending())?;
//! for record in upcoming.to_records()? {
//!     println!("{}: {:.0}°/{:.0}°", record.date, record.max_temp, record.min_temp);
//! }
//! # Ok::<(), forecast_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{ResultSet, Row};
pub use queries::{Direction, OrderKey, OrderTerm, Selection, SortOrder, SqlValue};
pub use schema::SCHEMA_VERSION;
pub use store::{BatchWriter, Store};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/forecast/weather.db`
/// - macOS: `~/Library/Application Support/forecast/weather.db`
/// - Windows: `C:\Users\<user>\AppData\Local\forecast\weather.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("forecast")
        .join("weather.db")
}
