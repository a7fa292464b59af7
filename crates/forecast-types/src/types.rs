//! Core types for forecast records.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::contract::Column;
use crate::date::{from_millis, is_date_normalized};
use crate::error::RecordError;

/// One day of forecast data.
///
/// Every measurement is mandatory. The `date` must be normalized to the
/// start of its UTC day (see [`crate::date::normalize_date`]) before the
/// record can be stored; [`WeatherRecord::validate`] checks this.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeatherRecord {
    /// Start of the UTC day, in milliseconds since the epoch.
    pub date: i64,
    /// Weather condition code. Not interpreted by this crate.
    pub weather_condition_id: i32,
    /// Minimum temperature in degrees Celsius.
    pub min_temp: f64,
    /// Maximum temperature in degrees Celsius.
    pub max_temp: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Atmospheric pressure in hPa.
    pub pressure: f64,
    /// Wind speed.
    pub wind_speed: f64,
    /// Wind direction in meteorological degrees.
    pub wind_direction_degrees: f64,
}

impl WeatherRecord {
    /// Create a builder for assembling a record field by field.
    pub fn builder() -> WeatherRecordBuilder {
        WeatherRecordBuilder::default()
    }

    /// Check that the record may be persisted.
    ///
    /// Fails if the date is not normalized or if any measurement is NaN or
    /// infinite.
    pub fn validate(&self) -> Result<(), RecordError> {
        if !is_date_normalized(self.date) {
            return Err(RecordError::NotNormalized(self.date));
        }
        for (column, value) in self.measurements() {
            if !value.is_finite() {
                return Err(RecordError::NonFiniteField(column.name()));
            }
        }
        Ok(())
    }

    /// The six measurements paired with their columns.
    pub fn measurements(&self) -> [(Column, f64); 6] {
        [
            (Column::MinTemp, self.min_temp),
            (Column::MaxTemp, self.max_temp),
            (Column::Humidity, self.humidity),
            (Column::Pressure, self.pressure),
            (Column::WindSpeed, self.wind_speed),
            (Column::Degrees, self.wind_direction_degrees),
        ]
    }

    /// The record's date as an instant, if representable.
    pub fn date_time(&self) -> Option<OffsetDateTime> {
        from_millis(self.date)
    }
}

/// Builder for [`WeatherRecord`].
///
/// Parsers fill in whatever the upstream response provided; `build` refuses
/// to produce a record while any field is missing.
#[derive(Debug, Default, Clone)]
#[must_use]
pub struct WeatherRecordBuilder {
    date: Option<i64>,
    weather_condition_id: Option<i32>,
    min_temp: Option<f64>,
    max_temp: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
    wind_speed: Option<f64>,
    wind_direction_degrees: Option<f64>,
}

impl WeatherRecordBuilder {
    /// Set the normalized date in milliseconds.
    pub fn date(mut self, date: i64) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the weather condition code.
    pub fn weather_condition_id(mut self, id: i32) -> Self {
        self.weather_condition_id = Some(id);
        self
    }

    /// Set the minimum and maximum temperatures.
    pub fn temperatures(mut self, min: f64, max: f64) -> Self {
        self.min_temp = Some(min);
        self.max_temp = Some(max);
        self
    }

    /// Set the humidity.
    pub fn humidity(mut self, humidity: f64) -> Self {
        self.humidity = Some(humidity);
        self
    }

    /// Set the pressure.
    pub fn pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Set wind speed and direction.
    pub fn wind(mut self, speed: f64, direction_degrees: f64) -> Self {
        self.wind_speed = Some(speed);
        self.wind_direction_degrees = Some(direction_degrees);
        self
    }

    /// Set a real-valued measurement by column.
    ///
    /// Integer columns are ignored; use [`Self::date`] and
    /// [`Self::weather_condition_id`] for those.
    pub fn measurement(mut self, column: Column, value: f64) -> Self {
        match column {
            Column::MinTemp => self.min_temp = Some(value),
            Column::MaxTemp => self.max_temp = Some(value),
            Column::Humidity => self.humidity = Some(value),
            Column::Pressure => self.pressure = Some(value),
            Column::WindSpeed => self.wind_speed = Some(value),
            Column::Degrees => self.wind_direction_degrees = Some(value),
            Column::Date | Column::WeatherId => {}
        }
        self
    }

    /// Build the record, reporting the first missing field.
    pub fn build(self) -> Result<WeatherRecord, RecordError> {
        fn require<T>(value: Option<T>, column: Column) -> Result<T, RecordError> {
            value.ok_or(RecordError::MissingField(column.name()))
        }

        Ok(WeatherRecord {
            date: require(self.date, Column::Date)?,
            weather_condition_id: require(self.weather_condition_id, Column::WeatherId)?,
            min_temp: require(self.min_temp, Column::MinTemp)?,
            max_temp: require(self.max_temp, Column::MaxTemp)?,
            humidity: require(self.humidity, Column::Humidity)?,
            pressure: require(self.pressure, Column::Pressure)?,
            wind_speed: require(self.wind_speed, Column::WindSpeed)?,
            wind_direction_degrees: require(self.wind_direction_degrees, Column::Degrees)?,
        })
    }
}
