//! Query results.

use std::sync::Arc;

use forecast_types::{Column, WeatherRecord};

use crate::error::{Error, Result};
use crate::queries::SqlValue;

/// One row of a [`ResultSet`].
///
/// Values are looked up by column, never by position, so a projection that
/// reorders columns cannot be misread.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[Column]>,
    values: Vec<SqlValue>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[Column]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Raw value of `column`, if it was projected.
    pub fn value(&self, column: Column) -> Option<&SqlValue> {
        let index = self.columns.iter().position(|c| *c == column)?;
        self.values.get(index)
    }

    /// Integer value of `column`.
    pub fn get_i64(&self, column: Column) -> Result<i64> {
        match self.value(column) {
            Some(SqlValue::Integer(value)) => Ok(*value),
            _ => Err(Error::UnexpectedValue(column.name())),
        }
    }

    /// Real value of `column`. Integers are widened.
    pub fn get_f64(&self, column: Column) -> Result<f64> {
        match self.value(column) {
            Some(SqlValue::Real(value)) => Ok(*value),
            Some(SqlValue::Integer(value)) => Ok(*value as f64),
            _ => Err(Error::UnexpectedValue(column.name())),
        }
    }

    /// Convert a fully projected row back into a record.
    pub fn to_record(&self) -> Result<WeatherRecord> {
        let weather_condition_id = i32::try_from(self.get_i64(Column::WeatherId)?)
            .map_err(|_| Error::UnexpectedValue(Column::WeatherId.name()))?;

        Ok(WeatherRecord {
            date: self.get_i64(Column::Date)?,
            weather_condition_id,
            min_temp: self.get_f64(Column::MinTemp)?,
            max_temp: self.get_f64(Column::MaxTemp)?,
            humidity: self.get_f64(Column::Humidity)?,
            pressure: self.get_f64(Column::Pressure)?,
            wind_speed: self.get_f64(Column::WindSpeed)?,
            wind_direction_degrees: self.get_f64(Column::Degrees)?,
        })
    }
}

/// An ordered, immutable snapshot of the rows a query returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Arc<[Column]>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub(crate) fn new(columns: Arc<[Column]>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// The projected columns, in query order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the query matched nothing.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The row at `index`.
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// The `date` of every row, in order.
    pub fn dates(&self) -> Result<Vec<i64>> {
        self.rows.iter().map(|row| row.get_i64(Column::Date)).collect()
    }

    /// Convert every row into a record. Requires a full projection.
    pub fn to_records(&self) -> Result<Vec<WeatherRecord>> {
        self.rows.iter().map(Row::to_record).collect()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
