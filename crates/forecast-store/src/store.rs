//! Main store implementation.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, info, warn};

use forecast_types::contract::TABLE_NAME;
use forecast_types::{Column, WeatherRecord};

use crate::error::{Error, Result};
use crate::models::{ResultSet, Row};
use crate::queries::{Selection, SortOrder, SqlValue};
use crate::schema;

/// SQLite-based store for forecast records.
///
/// The store owns the only connection to the database. Every operation takes
/// the connection lock for its whole duration, so a batch written through
/// [`Store::write_batch`] is never observed half-applied and two batches
/// never interleave.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Query the weather table.
    ///
    /// `projection` of `None` (or an empty slice) selects every column.
    pub fn query(
        &self,
        projection: Option<&[Column]>,
        selection: &Selection,
        order: &SortOrder,
    ) -> Result<ResultSet> {
        let columns: Arc<[Column]> = match projection {
            Some(columns) if !columns.is_empty() => Arc::from(columns),
            _ => Arc::from(&Column::ALL[..]),
        };
        let column_list = columns
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {column_list} FROM {TABLE_NAME}{}{}",
            selection.where_clause(),
            order.order_clause()
        );

        debug!("Executing query: {}", sql);

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(selection.args.iter()), |row| {
                let values = (0..columns.len())
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(Row::new(columns.clone(), values))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ResultSet::new(columns, rows))
    }

    /// Insert one record, replacing any row with the same date.
    ///
    /// Returns the new row id.
    pub fn insert(&self, record: &WeatherRecord) -> Result<i64> {
        let conn = self.lock()?;
        insert_record(&conn, record)
    }

    /// Delete the rows matching `selection`.
    ///
    /// A selection without a predicate deletes everything and still reports
    /// how many rows were removed.
    pub fn delete(&self, selection: &Selection) -> Result<usize> {
        let conn = self.lock()?;
        delete_rows(&conn, selection)
    }

    /// Count every stored row.
    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"), [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    /// Run `f` inside a single transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back if it
    /// returns `Err`; either way the connection stays locked until it ends.
    pub fn write_batch<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&BatchWriter<'_>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(Error::from)?;

        let outcome = f(&BatchWriter { conn: &tx });

        match outcome {
            Ok(value) => {
                tx.commit().map_err(Error::from)?;
                debug!("Batch committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    warn!("Rollback failed: {}", rollback);
                }
                debug!("Batch rolled back");
                Err(e)
            }
        }
    }
}

/// Write handle available inside [`Store::write_batch`].
pub struct BatchWriter<'a> {
    conn: &'a Connection,
}

impl BatchWriter<'_> {
    /// Insert one record as part of the batch, replacing any row with the
    /// same date. Returns the new row id.
    pub fn insert(&self, record: &WeatherRecord) -> Result<i64> {
        insert_record(self.conn, record)
    }

    /// Delete the rows matching `selection` as part of the batch.
    pub fn delete(&self, selection: &Selection) -> Result<usize> {
        delete_rows(self.conn, selection)
    }
}

fn delete_rows(conn: &Connection, selection: &Selection) -> Result<usize> {
    let sql = format!(
        "DELETE FROM {TABLE_NAME} WHERE ({})",
        selection.predicate_or_all()
    );
    debug!("Executing delete: {}", sql);

    let deleted = conn.execute(&sql, rusqlite::params_from_iter(selection.args.iter()))?;
    Ok(deleted)
}

fn insert_record(conn: &Connection, record: &WeatherRecord) -> Result<i64> {
    conn.execute(
        &format!(
            "INSERT INTO {TABLE_NAME} ({}, {}, {}, {}, {}, {}, {}, {})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            Column::Date,
            Column::WeatherId,
            Column::MinTemp,
            Column::MaxTemp,
            Column::Humidity,
            Column::Pressure,
            Column::WindSpeed,
            Column::Degrees,
        ),
        rusqlite::params![
            record.date,
            record.weather_condition_id,
            record.min_temp,
            record.max_temp,
            record.humidity,
            record.pressure,
            record.wind_speed,
            record.wind_direction_degrees,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_types::date::DAY_IN_MILLIS;

    fn record(day: i64, max_temp: f64) -> WeatherRecord {
        WeatherRecord {
            date: day * DAY_IN_MILLIS,
            weather_condition_id: 800,
            min_temp: max_temp - 8.0,
            max_temp,
            humidity: 65.0,
            pressure: 1012.0,
            wind_speed: 3.5,
            wind_direction_degrees: 270.0,
        }
    }

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("weather.db");

        let store = Store::open(&path).unwrap();
        store.insert(&record(19_000, 20.0)).unwrap();
        drop(store);

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_insert_and_query_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let original = record(19_000, 20.0);

        store.insert(&original).unwrap();

        let results = store
            .query(None, &Selection::all(), &SortOrder::new())
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.to_records().unwrap(), vec![original]);
    }

    #[test]
    fn test_insert_replaces_same_date() {
        let store = Store::open_in_memory().unwrap();

        store.insert(&record(19_000, 20.0)).unwrap();
        store.insert(&record(19_000, 25.0)).unwrap();

        let records = store
            .query(None, &Selection::all(), &SortOrder::new())
            .unwrap()
            .to_records()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].max_temp, 25.0);
    }

    #[test]
    fn test_query_projection_and_order() {
        let store = Store::open_in_memory().unwrap();
        for (day, max) in [(19_002, 10.0), (19_000, 30.0), (19_001, 20.0)] {
            store.insert(&record(day, max)).unwrap();
        }

        let results = store
            .query(
                Some(&[Column::MaxTemp, Column::Date][..]),
                &Selection::all(),
                &SortOrder::date_ascending(),
            )
            .unwrap();

        assert_eq!(results.columns(), &[Column::MaxTemp, Column::Date]);
        let maxes: Vec<f64> = results
            .iter()
            .map(|row| row.get_f64(Column::MaxTemp).unwrap())
            .collect();
        assert_eq!(maxes, vec![30.0, 20.0, 10.0]);
        assert!(results.get(0).unwrap().value(Column::Humidity).is_none());
    }

    #[test]
    fn test_query_with_selection_args() {
        let store = Store::open_in_memory().unwrap();
        for (day, max) in [(19_000, 10.0), (19_001, 20.0), (19_002, 30.0)] {
            store.insert(&record(day, max)).unwrap();
        }

        let selection = Selection::new("max >= ?").arg(20.0);
        let dates = store
            .query(None, &selection, &"date DESC".parse().unwrap())
            .unwrap()
            .dates()
            .unwrap();
        assert_eq!(dates, vec![19_002 * DAY_IN_MILLIS, 19_001 * DAY_IN_MILLIS]);
    }

    #[test]
    fn test_query_invalid_predicate_is_error() {
        let store = Store::open_in_memory().unwrap();
        let result = store.query(None, &Selection::new("no_such_column = 1"), &SortOrder::new());
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[test]
    fn test_delete_all_reports_count() {
        let store = Store::open_in_memory().unwrap();
        for day in 19_000..19_005 {
            store.insert(&record(day, 15.0)).unwrap();
        }

        let deleted = store.delete(&Selection::all()).unwrap();
        assert_eq!(deleted, 5);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_with_selection() {
        let store = Store::open_in_memory().unwrap();
        for day in 19_000..19_005 {
            store.insert(&record(day, 15.0)).unwrap();
        }

        let deleted = store
            .delete(&Selection::date_before(19_003 * DAY_IN_MILLIS))
            .unwrap();
        assert_eq!(deleted, 3);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_write_batch_commits() {
        let store = Store::open_in_memory().unwrap();

        let written: Result<usize> = store.write_batch(|batch| {
            for day in 19_000..19_003 {
                batch.insert(&record(day, 12.0))?;
            }
            Ok(3)
        });

        assert_eq!(written.unwrap(), 3);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_write_batch_rolls_back_on_error() {
        let store = Store::open_in_memory().unwrap();
        store.insert(&record(18_999, 5.0)).unwrap();

        let result: Result<()> = store.write_batch(|batch| {
            batch.insert(&record(19_000, 12.0))?;
            batch.insert(&record(18_999, 40.0))?;
            Err(Error::UnexpectedValue("date"))
        });

        assert!(result.is_err());
        let records = store
            .query(None, &Selection::all(), &SortOrder::new())
            .unwrap()
            .to_records()
            .unwrap();
        assert_eq!(records, vec![record(18_999, 5.0)]);
    }

    #[test]
    fn test_write_batch_delete_then_insert() {
        let store = Store::open_in_memory().unwrap();
        for day in 18_997..19_000 {
            store.insert(&record(day, 1.0)).unwrap();
        }

        let written: Result<(usize, usize)> = store.write_batch(|batch| {
            let deleted = batch.delete(&Selection::date_before(19_000 * DAY_IN_MILLIS))?;
            batch.insert(&record(18_998, 7.0))?;
            batch.insert(&record(19_000, 8.0))?;
            Ok((deleted, 2))
        });

        assert_eq!(written.unwrap(), (3, 2));
        let records = store
            .query(None, &Selection::all(), &SortOrder::date_ascending())
            .unwrap()
            .to_records()
            .unwrap();
        assert_eq!(records, vec![record(18_998, 7.0), record(19_000, 8.0)]);
    }

    #[test]
    fn test_write_batch_rollback_restores_deleted_rows() {
        let store = Store::open_in_memory().unwrap();
        store.insert(&record(18_999, 5.0)).unwrap();

        let result: Result<()> = store.write_batch(|batch| {
            assert_eq!(batch.delete(&Selection::all())?, 1);
            Err(Error::UnexpectedValue("date"))
        });

        assert!(result.is_err());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_nan_measurement_violates_not_null() {
        let store = Store::open_in_memory().unwrap();
        let mut bad = record(19_000, 12.0);
        bad.humidity = f64::NAN;

        assert!(matches!(store.insert(&bad), Err(Error::Database(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_store_is_shareable_across_threads() {
        let store = Arc::new(Store::open_in_memory().unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .write_batch(|batch| -> Result<()> {
                            for day in 0..10 {
                                batch.insert(&record(19_000 + day, f64::from(t)))?;
                            }
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = store
            .query(None, &Selection::all(), &SortOrder::date_ascending())
            .unwrap()
            .to_records()
            .unwrap();
        assert_eq!(records.len(), 10);
        // Batches never interleave, so every row carries the same writer's value.
        let first = records[0].max_temp;
        assert!(records.iter().all(|r| r.max_temp == first));
    }
}
