//! Locator routing.
//!
//! The router is the only place that decides what a locator means. Matching
//! is structural: the scheme and authority must match, then the path must be
//! exactly `weather` or `weather/<digits>`.

use tracing::debug;

use forecast_types::contract::{
    DEFAULT_AUTHORITY, Locator, PATH_WEATHER, build_locator_for_date, date_from_locator,
};

use crate::error::{Error, Result};

/// The operation target a locator resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Every record in the table.
    AllRecords,
    /// The record for one normalized day, in milliseconds.
    RecordsForDate(i64),
}

/// Maps locators under one authority to [`Route`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    authority: String,
}

impl Router {
    /// Create a router answering for `authority`.
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
        }
    }

    /// The authority this router answers for.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The locator addressing every record.
    pub fn all_records(&self) -> Locator {
        Locator::all_records(&self.authority)
    }

    /// The locator addressing the record for `date`.
    pub fn locator_for_date(&self, date: i64) -> Locator {
        build_locator_for_date(&self.authority, date)
    }

    /// Classify a locator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnrecognizedLocator`] if the locator has another
    /// scheme or authority, or a path of any other shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use forecast_core::router::{Route, Router};
    /// use forecast_types::Locator;
    ///
    /// let router = Router::new("forecast.provider");
    /// let route = router.resolve(&Locator::new("content://forecast.provider/weather/1704067200000"))?;
    /// assert_eq!(route, Route::RecordsForDate(1_704_067_200_000));
    /// # Ok::<(), forecast_core::Error>(())
    /// ```
    pub fn resolve(&self, locator: &Locator) -> Result<Route> {
        let unrecognized = || Error::UnrecognizedLocator(locator.to_string());

        if locator.authority() != Some(self.authority.as_str()) {
            return Err(unrecognized());
        }

        let route = match locator.path_segments().as_slice() {
            [PATH_WEATHER] => Route::AllRecords,
            [PATH_WEATHER, _] => {
                Route::RecordsForDate(date_from_locator(locator).ok_or_else(unrecognized)?)
            }
            _ => return Err(unrecognized()),
        };

        debug!("Resolved {} to {:?}", locator, route);
        Ok(route)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(DEFAULT_AUTHORITY)
    }
}
