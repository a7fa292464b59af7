//! Routed data provider for cached daily forecasts.
//!
//! This crate sits between the writer of forecast data (a periodic sync fed
//! by an external fetcher) and its readers (list and detail views). It owns
//! no storage itself: records live in a [`forecast_store::Store`] shared by
//! `Arc`, and every request is addressed by a [`Locator`].
//!
//! # Components
//!
//! - [`router`]: classifies a locator as all records or one day's record
//! - [`provider`]: query, batch insert and delete over the routed store
//! - [`events`]: change notification from writers to subscribed readers
//! - [`sync`]: entry point that writes a parsed forecast batch
//! - [`config`]: TOML configuration for storage, routing and sync
//!
//! # Locators
//!
//! | Locator | Route |
//! |---------|-------|
//! | `content://forecast.provider/weather` | [`Route::AllRecords`] |
//! | `content://forecast.provider/weather/<date>` | [`Route::RecordsForDate`] |
//!
//! The date segment is epoch milliseconds; values small enough to be epoch
//! seconds are widened.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use forecast_core::{Config, SyncTask, WeatherProvider};
//! use forecast_store::{Selection, SortOrder};
//!
//! # fn fetch() -> Vec<forecast_types::WeatherRecord> { Vec::new() }
//! let config = Config::load_default()?;
//! let provider = Arc::new(WeatherProvider::open(&config)?);
//!
//! let sync = SyncTask::new(Arc::clone(&provider), config.sync.clone());
//! if sync.needs_initial_sync()? {
//!     sync.sync_batch(&fetch())?;
//! }
//!
//! let mut result = provider.query(
//!     &provider.router().all_records(),
//!     None,
//!     &Selection::today_onwards(),
//!     &SortOrder::date_ascending(),
//! )?;
//! println!("{} days cached", result.rows.len());
//!
//! // Re-query when the next sync lands.
//! if result.subscription.blocking_changed().is_some() {
//!     println!("forecast updated");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod provider;
pub mod router;
pub mod sync;

pub use config::{Config, ConfigError, ProviderConfig, StorageConfig, SyncConfig};
pub use error::{Error, Result};
pub use events::{ChangeEvent, ChangeKind, ChangeNotifier, ChangeSubscription};
pub use provider::{BatchOutcome, QueryResult, WeatherProvider};
pub use router::{Route, Router};
pub use sync::{SyncReport, SyncTask};

// Re-export the record types so callers need only this crate for the common path.
pub use forecast_types::{Column, Locator, RecordError, WeatherRecord};
