//! Database schema and upgrades.
//!
//! The weather table is a rolling cache refreshed by every sync, so an
//! upgrade simply drops the table and recreates it at the new version.

use rusqlite::Connection;
use tracing::info;

use forecast_types::contract::{Column, ROW_ID, TABLE_NAME};

use crate::error::{Error, Result};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize(conn: &Connection) -> Result<()> {
    initialize_to(conn, SCHEMA_VERSION)
}

fn initialize_to(conn: &Connection, target: i32) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == target {
        return Ok(());
    }
    if version > target {
        return Err(Error::UnsupportedSchemaVersion {
            found: version,
            supported: target,
        });
    }

    if version > 0 {
        info!(
            "Upgrading schema from version {} to {}; cached forecast data is discarded",
            version, target
        );
    }
    recreate_weather_table(conn)?;
    set_schema_version(conn, target)?;

    Ok(())
}

/// Get the current schema version, or 0 for a fresh database.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// SQL creating the weather table.
///
/// `date` is unique with `ON CONFLICT REPLACE`, which turns every insert into
/// an upsert keyed by day without any read-before-write.
pub fn create_weather_table_sql() -> String {
    format!(
        "CREATE TABLE {table} (
            {id} INTEGER PRIMARY KEY AUTOINCREMENT,
            {date} INTEGER NOT NULL,
            {weather_id} INTEGER NOT NULL,
            {min} REAL NOT NULL,
            {max} REAL NOT NULL,
            {humidity} REAL NOT NULL,
            {pressure} REAL NOT NULL,
            {wind} REAL NOT NULL,
            {degrees} REAL NOT NULL,
            UNIQUE ({date}) ON CONFLICT REPLACE
        )",
        table = TABLE_NAME,
        id = ROW_ID,
        date = Column::Date,
        weather_id = Column::WeatherId,
        min = Column::MinTemp,
        max = Column::MaxTemp,
        humidity = Column::Humidity,
        pressure = Column::Pressure,
        wind = Column::WindSpeed,
        degrees = Column::Degrees,
    )
}

fn recreate_weather_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );
        DROP TABLE IF EXISTS {TABLE_NAME};
        {};",
        create_weather_table_sql()
    ))?;
    Ok(())
}
