//! The routed data provider.
//!
//! [`WeatherProvider`] is the single entry point for reading and writing
//! forecast records. It resolves each locator through the [`Router`],
//! executes the operation against the shared [`Store`], and publishes a
//! change event after every write that touched at least one row.
//!
//! The provider keeps no state between calls. Writes only happen in batches:
//! each [`WeatherProvider::bulk_insert`] runs in one transaction that either
//! commits every record or none of them.

use std::sync::Arc;

use tracing::{debug, info, warn};

use forecast_store::{ResultSet, Selection, SortOrder, Store};
use forecast_types::{Column, Locator, WeatherRecord};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{ChangeEvent, ChangeKind, ChangeNotifier, ChangeSubscription};
use crate::router::{Route, Router};

/// Rows returned by [`WeatherProvider::query`], with a subscription that
/// fires when a later write affects the queried locator.
#[derive(Debug)]
pub struct QueryResult {
    /// Snapshot of the matching rows.
    pub rows: ResultSet,
    /// Change subscription for the queried locator.
    pub subscription: ChangeSubscription,
}

/// Rows affected by one batch write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Rows inserted or replaced.
    pub inserted: usize,
    /// Rows deleted before the inserts.
    pub deleted: usize,
}

impl BatchOutcome {
    fn change_event(&self, locator: &Locator) -> Option<ChangeEvent> {
        let kind = match (self.inserted, self.deleted) {
            (0, 0) => return None,
            (count, 0) => ChangeKind::Inserted { count },
            (0, count) => ChangeKind::Deleted { count },
            (inserted, deleted) => ChangeKind::Replaced { inserted, deleted },
        };
        Some(ChangeEvent {
            locator: locator.clone(),
            kind,
        })
    }
}

/// Routed query/insert/delete over the weather table.
pub struct WeatherProvider {
    store: Arc<Store>,
    router: Router,
    notifier: ChangeNotifier,
}

impl WeatherProvider {
    /// Create a provider over an already opened store.
    pub fn new(store: Arc<Store>, router: Router) -> Self {
        Self::with_notifier(store, router, ChangeNotifier::default())
    }

    /// Create a provider with an explicit notifier.
    pub fn with_notifier(store: Arc<Store>, router: Router, notifier: ChangeNotifier) -> Self {
        Self {
            store,
            router,
            notifier,
        }
    }

    /// Validate `config`, open its database and build a provider for it.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let store = Store::open(&config.storage.path)?;
        Ok(Self::with_notifier(
            Arc::new(store),
            Router::new(config.provider.authority.clone()),
            ChangeNotifier::new(config.provider.notify_buffer),
        ))
    }

    /// The router used to resolve locators.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Observe changes to `locator` without querying.
    pub fn subscribe(&self, locator: &Locator) -> ChangeSubscription {
        self.notifier.subscribe(locator.clone())
    }

    /// Query records.
    ///
    /// For a per-day locator the embedded date is the only filter and
    /// `selection` is ignored; for the all-records locator `selection` is
    /// applied as given. `order` is honored in both cases.
    ///
    /// # Errors
    ///
    /// [`Error::UnrecognizedLocator`] if the locator cannot be routed, and
    /// [`Error::StorageFailure`] if the query fails.
    pub fn query(
        &self,
        locator: &Locator,
        projection: Option<&[Column]>,
        selection: &Selection,
        order: &SortOrder,
    ) -> Result<QueryResult> {
        let route = self.router.resolve(locator)?;

        // Subscribe first so a write committing right after the read is not lost.
        let subscription = self.subscribe(locator);

        let rows = match route {
            Route::RecordsForDate(date) => {
                self.store
                    .query(projection, &Selection::date_equals(date), order)?
            }
            Route::AllRecords => self.store.query(projection, selection, order)?,
        };

        debug!("Query on {} returned {} rows", locator, rows.len());
        Ok(QueryResult { rows, subscription })
    }

    /// Insert a batch of records in one transaction.
    ///
    /// Records whose date is already stored replace the existing row. Every
    /// record is validated before it is written; the first invalid record
    /// rolls the whole batch back. Returns the number of rows written, where
    /// a replacement counts as one.
    ///
    /// # Errors
    ///
    /// - [`Error::UnrecognizedLocator`] if the locator cannot be routed
    /// - [`Error::UnsupportedOperation`] for a per-day locator
    /// - [`Error::InvalidRecord`] if any record fails validation
    /// - [`Error::StorageFailure`] if the store fails
    pub fn bulk_insert(&self, locator: &Locator, records: &[WeatherRecord]) -> Result<usize> {
        Ok(self.write_records(locator, records, None)?.inserted)
    }

    /// Delete the rows matching `stale`, then insert `records`, all in one
    /// transaction.
    ///
    /// Records in the batch are written after the delete, so they survive
    /// even when `stale` matches their dates. Readers observe a single
    /// change. Fails like [`Self::bulk_insert`]; on failure neither the
    /// delete nor any insert is applied.
    pub fn replace_batch(
        &self,
        locator: &Locator,
        records: &[WeatherRecord],
        stale: &Selection,
    ) -> Result<BatchOutcome> {
        self.write_records(locator, records, Some(stale))
    }

    fn write_records(
        &self,
        locator: &Locator,
        records: &[WeatherRecord],
        stale: Option<&Selection>,
    ) -> Result<BatchOutcome> {
        self.require_all_records(locator, "bulk insert")?;

        let result: Result<BatchOutcome> = self.store.write_batch(|batch| {
            let mut outcome = BatchOutcome::default();
            if let Some(stale) = stale {
                outcome.deleted = batch.delete(stale)?;
            }
            for (index, record) in records.iter().enumerate() {
                record
                    .validate()
                    .map_err(|source| Error::InvalidRecord { index, source })?;
                batch.insert(record)?;
                outcome.inserted += 1;
            }
            Ok(outcome)
        });

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Rejected batch of {} records for {}: {}", records.len(), locator, e);
                return Err(e);
            }
        };

        if let Some(event) = outcome.change_event(locator) {
            self.notifier.notify(event);
        }

        info!(
            "Inserted {} forecast records, deleted {}",
            outcome.inserted, outcome.deleted
        );
        Ok(outcome)
    }

    /// Delete records matching `selection`.
    ///
    /// A selection without a predicate deletes every row. Returns the number
    /// of rows deleted.
    ///
    /// # Errors
    ///
    /// - [`Error::UnrecognizedLocator`] if the locator cannot be routed
    /// - [`Error::UnsupportedOperation`] for a per-day locator
    /// - [`Error::StorageFailure`] if the store fails
    pub fn delete(&self, locator: &Locator, selection: &Selection) -> Result<usize> {
        self.require_all_records(locator, "delete")?;

        let deleted = self.store.delete(selection)?;

        if deleted > 0 {
            self.notifier
                .notify(ChangeEvent::deleted(locator.clone(), deleted));
        }

        debug!("Deleted {} forecast records", deleted);
        Ok(deleted)
    }

    /// Single-row insert. Always fails: records only arrive in batches.
    pub fn insert(&self, locator: &Locator, _record: &WeatherRecord) -> Result<Locator> {
        Err(Error::UnsupportedOperation(format!(
            "insert into {locator}; use bulk_insert"
        )))
    }

    /// In-place update. Always fails: records are replaced wholesale.
    pub fn update(
        &self,
        locator: &Locator,
        _record: &WeatherRecord,
        _selection: &Selection,
    ) -> Result<usize> {
        Err(Error::UnsupportedOperation(format!("update of {locator}")))
    }

    /// Content type lookup. Always fails.
    pub fn get_type(&self, locator: &Locator) -> Result<String> {
        Err(Error::UnsupportedOperation(format!("get_type for {locator}")))
    }

    fn require_all_records(&self, locator: &Locator, operation: &str) -> Result<()> {
        match self.router.resolve(locator)? {
            Route::AllRecords => Ok(()),
            Route::RecordsForDate(_) => Err(Error::UnsupportedOperation(format!(
                "{operation} on per-day locator {locator}"
            ))),
        }
    }
}
