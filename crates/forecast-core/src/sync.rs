//! Sync entry point.
//!
//! The scheduler fetches and parses a forecast batch elsewhere, then hands it
//! to [`SyncTask::sync_batch`]. The batch, together with the pruning of past
//! days, is written through the provider in one transaction, so subscribers
//! see it all at once or not at all.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info};

use forecast_store::{Selection, SortOrder};
use forecast_types::contract::today_onwards_predicate_at;
use forecast_types::date::normalized_utc_date_at;
use forecast_types::{Column, WeatherRecord};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::provider::WeatherProvider;

/// Outcome of one sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Rows inserted or replaced.
    pub inserted: usize,
    /// Past rows deleted before the insert.
    pub pruned: usize,
}

/// Feeds parsed forecast batches into the provider.
pub struct SyncTask {
    provider: Arc<WeatherProvider>,
    config: SyncConfig,
}

impl SyncTask {
    pub fn new(provider: Arc<WeatherProvider>, config: SyncConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &Arc<WeatherProvider> {
        &self.provider
    }

    /// Write a parsed batch.
    ///
    /// An empty batch changes nothing. Otherwise, when pruning is enabled,
    /// rows dated before today are deleted and the records are then bulk
    /// inserted, in a single transaction. Records in the batch are never
    /// pruned by their own sync. A rejected batch leaves the store untouched
    /// and prunes nothing.
    pub fn sync_batch(&self, records: &[WeatherRecord]) -> Result<SyncReport> {
        self.sync_batch_at(records, OffsetDateTime::now_utc())
    }

    /// Like [`Self::sync_batch`] with an explicit notion of "now".
    pub fn sync_batch_at(
        &self,
        records: &[WeatherRecord],
        now: OffsetDateTime,
    ) -> Result<SyncReport> {
        if records.is_empty() {
            debug!("Empty forecast batch, nothing to sync");
            return Ok(SyncReport::default());
        }

        let locator = self.provider.router().all_records();
        let (inserted, pruned) = if self.config.prune_past {
            let stale = Selection::date_before(normalized_utc_date_at(now));
            let outcome = self.provider.replace_batch(&locator, records, &stale)?;
            (outcome.inserted, outcome.deleted)
        } else {
            (self.provider.bulk_insert(&locator, records)?, 0)
        };

        info!(
            "Forecast sync complete: {} inserted, {} pruned",
            inserted, pruned
        );
        Ok(SyncReport { inserted, pruned })
    }

    /// Whether nothing is stored for today or later.
    pub fn needs_initial_sync(&self) -> Result<bool> {
        self.needs_initial_sync_at(OffsetDateTime::now_utc())
    }

    /// Like [`Self::needs_initial_sync`] with an explicit notion of "now".
    pub fn needs_initial_sync_at(&self, now: OffsetDateTime) -> Result<bool> {
        let (predicate, today) = today_onwards_predicate_at(now);
        let result = self.provider.query(
            &self.provider.router().all_records(),
            Some(&[Column::Date][..]),
            &Selection::new(predicate).arg(today),
            &SortOrder::new(),
        )?;
        Ok(result.rows.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeKind;
    use crate::router::Router;
    use forecast_store::Store;
    use forecast_types::date::DAY_IN_MILLIS;
    use time::macros::datetime;

    // 2024-01-10T00:00:00Z
    const TODAY: i64 = 1_704_844_800_000;

    fn now() -> OffsetDateTime {
        datetime!(2024-01-10 15:30 UTC)
    }

    fn last_week() -> OffsetDateTime {
        datetime!(2024-01-03 06:00 UTC)
    }

    fn task(prune_past: bool) -> SyncTask {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let provider = Arc::new(WeatherProvider::new(store, Router::default()));
        SyncTask::new(provider, SyncConfig { prune_past })
    }

    fn forecast(first_day: i64, days: i64) -> Vec<WeatherRecord> {
        (0..days)
            .map(|d| WeatherRecord {
                date: TODAY + (first_day + d) * DAY_IN_MILLIS,
                weather_condition_id: 500,
                min_temp: 3.0,
                max_temp: 9.0 + d as f64,
                humidity: 80.0,
                pressure: 1008.0,
                wind_speed: 6.5,
                wind_direction_degrees: 270.0,
            })
            .collect()
    }

    fn stored_dates(task: &SyncTask) -> Vec<i64> {
        let provider = task.provider();
        provider
            .query(
                &provider.router().all_records(),
                None,
                &Selection::all(),
                &SortOrder::date_ascending(),
            )
            .unwrap()
            .rows
            .dates()
            .unwrap()
    }

    #[test]
    fn test_sync_batch_inserts() {
        let task = task(true);
        let report = task.sync_batch_at(&forecast(0, 14), now()).unwrap();
        assert_eq!(
            report,
            SyncReport {
                inserted: 14,
                pruned: 0
            }
        );
        assert_eq!(stored_dates(&task).len(), 14);
    }

    #[test]
    fn test_sync_batch_prunes_past_days() {
        let task = task(true);
        task.sync_batch_at(&forecast(-3, 5), last_week()).unwrap();

        let report = task.sync_batch_at(&forecast(0, 3), now()).unwrap();
        assert_eq!(report.pruned, 3);
        assert_eq!(
            stored_dates(&task),
            vec![TODAY, TODAY + DAY_IN_MILLIS, TODAY + 2 * DAY_IN_MILLIS]
        );
    }

    #[test]
    fn test_sync_batch_without_pruning_keeps_history() {
        let task = task(false);
        task.sync_batch_at(&forecast(-3, 3), now()).unwrap();

        let report = task.sync_batch_at(&forecast(0, 2), now()).unwrap();
        assert_eq!(report.pruned, 0);
        assert_eq!(stored_dates(&task).len(), 5);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let task = task(true);
        task.sync_batch_at(&forecast(-2, 4), last_week()).unwrap();
        let all = task.provider().router().all_records();
        let mut subscription = task.provider().subscribe(&all);

        let report = task.sync_batch_at(&[], now()).unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(stored_dates(&task).len(), 4);
        assert!(subscription.try_changed().is_none());
    }

    #[test]
    fn test_rejected_batch_prunes_nothing() {
        let task = task(true);
        task.sync_batch_at(&forecast(-2, 4), last_week()).unwrap();

        let mut batch = forecast(0, 14);
        batch[7].date += 1;
        assert!(task.sync_batch_at(&batch, now()).is_err());
        assert_eq!(stored_dates(&task).len(), 4);
    }

    #[test]
    fn test_sync_publishes_single_change() {
        let task = task(true);
        task.sync_batch_at(&forecast(-1, 1), last_week()).unwrap();
        let all = task.provider().router().all_records();
        let mut subscription = task.provider().subscribe(&all);

        task.sync_batch_at(&forecast(0, 2), now()).unwrap();

        assert_eq!(
            subscription.try_changed().map(|e| e.kind),
            Some(ChangeKind::Replaced {
                inserted: 2,
                deleted: 1
            })
        );
        assert!(subscription.try_changed().is_none());
    }

    #[test]
    fn test_sync_keeps_past_records_of_its_own_batch() {
        let task = task(true);
        task.sync_batch_at(&forecast(-5, 1), last_week()).unwrap();

        let batch = forecast(-2, 5);
        let report = task.sync_batch_at(&batch, now()).unwrap();

        assert_eq!(
            report,
            SyncReport {
                inserted: 5,
                pruned: 1
            }
        );
        let expected: Vec<i64> = batch.iter().map(|r| r.date).collect();
        assert_eq!(stored_dates(&task), expected);
    }

    #[test]
    fn test_sync_without_pruning_notifies_insert_only() {
        let task = task(false);
        let all = task.provider().router().all_records();
        let mut subscription = task.provider().subscribe(&all);

        task.sync_batch_at(&forecast(0, 3), now()).unwrap();

        assert_eq!(
            subscription.try_changed().map(|e| e.kind),
            Some(ChangeKind::Inserted { count: 3 })
        );
    }

    #[test]
    fn test_needs_initial_sync() {
        let task = task(false);
        assert!(task.needs_initial_sync_at(now()).unwrap());

        task.sync_batch_at(&forecast(-2, 2), now()).unwrap();
        assert!(task.needs_initial_sync_at(now()).unwrap());

        task.sync_batch_at(&forecast(0, 1), now()).unwrap();
        assert!(!task.needs_initial_sync_at(now()).unwrap());
    }
}
