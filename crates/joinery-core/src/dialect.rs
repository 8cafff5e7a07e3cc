//! SQL dialects and identifier quoting.

use serde::{Deserialize, Serialize};

/// SQL dialect for generating dialect-specific SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL dialect (uses $1, $2 placeholders)
    #[default]
    Postgres,
    /// SQLite dialect (uses ?1, ?2 placeholders)
    Sqlite,
    /// MySQL dialect (uses ? placeholders)
    Mysql,
}

impl Dialect {
    /// Generate a placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Quote a single identifier for this dialect.
    ///
    /// Embedded quote characters are doubled:
    /// - For Postgres/SQLite: `"` becomes `""`
    /// - For MySQL: `` ` `` becomes ``` `` ```
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
            Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
        }
    }

    /// Quote a possibly dotted name.
    ///
    /// `p.id` becomes `"p"."id"`. With `ignore_dots` the dots are part of the
    /// identifier, so `p.id` becomes `"p.id"`; output aliases built with a
    /// `.` divider rely on this.
    pub fn quote_name(self, name: &str, ignore_dots: bool) -> String {
        if ignore_dots || !name.contains('.') {
            return self.quote_identifier(name);
        }
        name.split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    self.quote_identifier(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}
