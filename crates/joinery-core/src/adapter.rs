//! Schema introspection and database adapter seams.

use crate::Result;
use crate::value::Value;

/// The sentinel MySQL-style databases store for "no date".
pub const DEFAULT_NULL_DATE: &str = "0000-00-00 00:00:00";

/// Lists the columns of a table.
///
/// Auto-selection asks this for every FROM and JOIN source, so
/// implementations usually cache.
pub trait SchemaIntrospector: Send + Sync {
    /// Column names of `table`, in table order.
    #[allow(clippy::result_large_err)]
    fn column_names(&self, table: &str) -> Result<Vec<String>>;
}

/// Database-specific knowledge the ORM needs besides introspection.
pub trait DatabaseAdapter: SchemaIntrospector {
    /// The value this database uses as a "null date".
    fn null_date(&self) -> &str {
        DEFAULT_NULL_DATE
    }

    /// Whether `value` is this database's null-date sentinel.
    ///
    /// Matches the full sentinel or its date part (`0000-00-00`).
    fn is_null_date(&self, value: &Value) -> bool {
        let Some(text) = value.as_str() else {
            return false;
        };
        let sentinel = self.null_date();
        let date_part = sentinel.split(' ').next().unwrap_or(sentinel);
        text == sentinel || text == date_part
    }
}

/// An adapter backed by a fixed table -> columns map.
///
/// Useful when the schema is known up front, and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    tables: indexmap::IndexMap<String, Vec<String>>,
    null_date: Option<String>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the columns of a table.
    #[must_use]
    pub fn table<I, S>(mut self, name: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .insert(name.to_string(), columns.into_iter().map(Into::into).collect());
        self
    }

    /// Override the null-date sentinel.
    #[must_use]
    pub fn with_null_date(mut self, sentinel: impl Into<String>) -> Self {
        self.null_date = Some(sentinel.into());
        self
    }
}

impl SchemaIntrospector for StaticSchema {
    fn column_names(&self, table: &str) -> Result<Vec<String>> {
        self.tables.get(table).cloned().ok_or_else(|| {
            crate::Error::query(
                crate::error::QueryErrorKind::NotFound,
                format!("table '{}' does not exist", table),
            )
        })
    }
}

impl DatabaseAdapter for StaticSchema {
    fn null_date(&self) -> &str {
        self.null_date.as_deref().unwrap_or(DEFAULT_NULL_DATE)
    }
}
