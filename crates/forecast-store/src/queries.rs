//! Selection and ordering builders for weather queries.
//!
//! [`Selection`] carries a SQL predicate with `?` placeholders and its
//! arguments, the way a caller filters rows. [`SortOrder`] is a typed
//! `ORDER BY` clause; it can be built fluently or parsed from text such as
//! `"date ASC"`.
//!
//! # Example
//!
//! ```
//! use forecast_store::{Selection, SortOrder};
//! use forecast_types::Column;
//!
//! let selection = Selection::new("max > ? AND humidity < ?").arg(20.0).arg(60.0);
//! let order: SortOrder = "date DESC".parse()?;
//! assert_eq!(order, SortOrder::new().descending(Column::Date));
//! # let _ = selection;
//! # Ok::<(), forecast_store::Error>(())
//! ```

use core::str::FromStr;

use forecast_types::contract::{Column, ROW_ID, today_onwards_predicate};

use crate::error::Error;

pub use rusqlite::types::Value as SqlValue;

/// A row filter: predicate text plus positional arguments.
///
/// A selection without a predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// SQL predicate using `?` placeholders.
    pub predicate: Option<String>,
    /// Values bound to the placeholders, in order.
    pub args: Vec<SqlValue>,
}

impl Selection {
    /// Match every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter with a predicate.
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: Some(predicate.into()),
            args: Vec::new(),
        }
    }

    /// Bind the next positional argument.
    pub fn arg(mut self, value: impl Into<SqlValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Match the single row stored for `date`.
    pub fn date_equals(date: i64) -> Self {
        Self::new(format!("{} = ?", Column::Date)).arg(date)
    }

    /// Match rows dated strictly before `date`.
    pub fn date_before(date: i64) -> Self {
        Self::new(format!("{} < ?", Column::Date)).arg(date)
    }

    /// Match today's row and every later one.
    pub fn today_onwards() -> Self {
        let (predicate, today) = today_onwards_predicate();
        Self::new(predicate).arg(today)
    }

    /// Whether this selection filters nothing.
    pub fn is_all(&self) -> bool {
        self.predicate.is_none()
    }

    /// The predicate, or the always-true predicate `1`.
    ///
    /// SQLite reports an accurate change count for `DELETE ... WHERE 1`.
    pub(crate) fn predicate_or_all(&self) -> &str {
        self.predicate.as_deref().unwrap_or("1")
    }

    pub(crate) fn where_clause(&self) -> String {
        match &self.predicate {
            Some(predicate) => format!(" WHERE ({predicate})"),
            None => String::new(),
        }
    }
}

/// Direction of one ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn sql(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// What an ordering term sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    /// Insertion order.
    RowId,
    /// A table column.
    Column(Column),
}

impl OrderKey {
    fn sql(self) -> &'static str {
        match self {
            OrderKey::RowId => ROW_ID,
            OrderKey::Column(column) => column.name(),
        }
    }
}

/// One `<key> <direction>` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub key: OrderKey,
    pub direction: Direction,
}

/// Fluent `ORDER BY` builder.
///
/// An empty order leaves row order to SQLite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    terms: Vec<OrderTerm>,
}

impl SortOrder {
    /// An empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest day first, the order list views use.
    pub fn date_ascending() -> Self {
        Self::new().ascending(Column::Date)
    }

    /// Append an ascending term.
    pub fn ascending(self, column: Column) -> Self {
        self.then(OrderKey::Column(column), Direction::Ascending)
    }

    /// Append a descending term.
    pub fn descending(self, column: Column) -> Self {
        self.then(OrderKey::Column(column), Direction::Descending)
    }

    /// Append an arbitrary term.
    pub fn then(mut self, key: OrderKey, direction: Direction) -> Self {
        self.terms.push(OrderTerm { key, direction });
        self
    }

    /// The terms in priority order.
    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    /// Whether no term was given.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn order_clause(&self) -> String {
        if self.terms.is_empty() {
            return String::new();
        }
        let terms = self
            .terms
            .iter()
            .map(|term| format!("{} {}", term.key.sql(), term.direction.sql()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(" ORDER BY {terms}")
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut order = SortOrder::new();
        for term in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let mut words = term.split_whitespace();
            let key = match words.next() {
                Some(ROW_ID) => OrderKey::RowId,
                Some(name) => OrderKey::Column(
                    name.parse()
                        .map_err(|_| Error::InvalidSortOrder(term.to_string()))?,
                ),
                None => continue,
            };
            let direction = match words.next() {
                None => Direction::Ascending,
                Some(word) if word.eq_ignore_ascii_case("asc") => Direction::Ascending,
                Some(word) if word.eq_ignore_ascii_case("desc") => Direction::Descending,
                Some(_) => return Err(Error::InvalidSortOrder(term.to_string())),
            };
            if words.next().is_some() {
                return Err(Error::InvalidSortOrder(term.to_string()));
            }
            order = order.then(key, direction);
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_types::date::normalized_utc_date_for_today;

    // ==================== Selection Tests ====================

    #[test]
    fn test_selection_all() {
        let selection = Selection::all();
        assert!(selection.is_all());
        assert_eq!(selection.where_clause(), "");
        assert_eq!(selection.predicate_or_all(), "1");
    }

    #[test]
    fn test_selection_with_args() {
        let selection = Selection::new("min > ?").arg(5.0).arg(7i64);
        assert_eq!(selection.where_clause(), " WHERE (min > ?)");
        assert_eq!(
            selection.args,
            vec![SqlValue::Real(5.0), SqlValue::Integer(7)]
        );
    }

    #[test]
    fn test_selection_date_equals() {
        let selection = Selection::date_equals(86_400_000);
        assert_eq!(selection.predicate.as_deref(), Some("date = ?"));
        assert_eq!(selection.args, vec![SqlValue::Integer(86_400_000)]);
    }

    #[test]
    fn test_selection_date_before() {
        let selection = Selection::date_before(0);
        assert_eq!(selection.predicate_or_all(), "date < ?");
    }

    #[test]
    fn test_selection_today_onwards() {
        let selection = Selection::today_onwards();
        assert_eq!(selection.predicate.as_deref(), Some("date >= ?"));
        assert_eq!(
            selection.args,
            vec![SqlValue::Integer(normalized_utc_date_for_today())]
        );
    }

    // ==================== SortOrder Tests ====================

    #[test]
    fn test_sort_order_empty() {
        let order = SortOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.order_clause(), "");
    }

    #[test]
    fn test_sort_order_chaining() {
        let order = SortOrder::new()
            .descending(Column::MaxTemp)
            .ascending(Column::Date);
        assert_eq!(order.order_clause(), " ORDER BY max DESC, date ASC");
    }

    #[test]
    fn test_sort_order_parse() {
        let order: SortOrder = "date ASC".parse().unwrap();
        assert_eq!(order, SortOrder::date_ascending());

        let order: SortOrder = "max desc, _id".parse().unwrap();
        assert_eq!(
            order.terms(),
            &[
                OrderTerm {
                    key: OrderKey::Column(Column::MaxTemp),
                    direction: Direction::Descending,
                },
                OrderTerm {
                    key: OrderKey::RowId,
                    direction: Direction::Ascending,
                },
            ]
        );
    }

    #[test]
    fn test_sort_order_parse_empty() {
        let order: SortOrder = "  ".parse().unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn test_sort_order_parse_unknown_column() {
        let err = "date; DROP TABLE weather".parse::<SortOrder>().unwrap_err();
        assert!(matches!(err, Error::InvalidSortOrder(_)));

        let err = "colour ASC".parse::<SortOrder>().unwrap_err();
        assert!(matches!(err, Error::InvalidSortOrder(_)));
    }

    #[test]
    fn test_sort_order_parse_bad_direction() {
        let err = "date sideways".parse::<SortOrder>().unwrap_err();
        assert!(matches!(err, Error::InvalidSortOrder(_)));

        let err = "date ASC extra".parse::<SortOrder>().unwrap_err();
        assert!(matches!(err, Error::InvalidSortOrder(_)));
    }
}
