//! Query sources and JOIN clauses.

use crate::expr::Expr;
use crate::query::Query;
use joinery_core::{Dialect, EntityMetadata, Error, QueryErrorKind, Result, Value};
use std::sync::Arc;

/// Types of SQL joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    /// Get the SQL keyword for this join type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// What a FROM or JOIN names, before an alias is settled.
#[derive(Debug, Clone)]
pub enum JoinTarget {
    /// A raw table name
    Table(String),
    /// A mapped entity
    Entity(Arc<EntityMetadata>),
    /// A nested query
    Subquery(Box<Query>),
}

impl From<&str> for JoinTarget {
    fn from(name: &str) -> Self {
        JoinTarget::Table(name.to_string())
    }
}

impl From<String> for JoinTarget {
    fn from(name: String) -> Self {
        JoinTarget::Table(name)
    }
}

impl From<Arc<EntityMetadata>> for JoinTarget {
    fn from(metadata: Arc<EntityMetadata>) -> Self {
        JoinTarget::Entity(metadata)
    }
}

impl From<Query> for JoinTarget {
    fn from(query: Query) -> Self {
        JoinTarget::Subquery(Box::new(query))
    }
}

impl JoinTarget {
    /// Bind the target to an alias.
    ///
    /// Without an explicit alias a table uses its name, an entity its
    /// declared table alias and a subquery `fallback`.
    pub fn into_source(self, alias: Option<&str>, fallback: &str) -> TableSource {
        match self {
            JoinTarget::Table(name) => TableSource::Table {
                alias: alias.unwrap_or(&name).to_string(),
                name,
            },
            JoinTarget::Entity(metadata) => TableSource::Entity {
                alias: alias.unwrap_or(metadata.alias).to_string(),
                metadata,
            },
            JoinTarget::Subquery(query) => TableSource::Subquery {
                alias: alias.unwrap_or(fallback).to_string(),
                query,
            },
        }
    }
}

/// One table, entity or subquery taking part in a query.
#[derive(Debug, Clone)]
pub enum TableSource {
    Table {
        name: String,
        alias: String,
    },
    Entity {
        metadata: Arc<EntityMetadata>,
        alias: String,
    },
    Subquery {
        query: Box<Query>,
        alias: String,
    },
}

impl TableSource {
    pub fn alias(&self) -> &str {
        match self {
            TableSource::Table { alias, .. }
            | TableSource::Entity { alias, .. }
            | TableSource::Subquery { alias, .. } => alias,
        }
    }

    /// The physical table name; `None` for subqueries.
    pub fn table_name(&self) -> Option<&str> {
        match self {
            TableSource::Table { name, .. } => Some(name),
            TableSource::Entity { metadata, .. } => Some(metadata.table),
            TableSource::Subquery { .. } => None,
        }
    }

    pub fn metadata(&self) -> Option<&Arc<EntityMetadata>> {
        match self {
            TableSource::Entity { metadata, .. } => Some(metadata),
            _ => None,
        }
    }

    pub fn is_subquery(&self) -> bool {
        matches!(self, TableSource::Subquery { .. })
    }

    /// `table AS alias`, or `(subquery) AS alias`.
    #[allow(clippy::result_large_err)]
    pub fn build(&self, dialect: Dialect, params: &mut Vec<Value>) -> Result<String> {
        let alias = self.alias();
        match self {
            TableSource::Subquery { query, .. } => {
                let sql = query.build_into(dialect, params)?;
                Ok(format!("({sql}) AS {}", dialect.quote_identifier(alias)))
            }
            _ => {
                let name = self.table_name().unwrap_or_default();
                let quoted = dialect.quote_identifier(name);
                if name == alias {
                    Ok(quoted)
                } else {
                    Ok(format!("{quoted} AS {}", dialect.quote_identifier(alias)))
                }
            }
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone)]
pub struct Join {
    /// Type of join
    pub join_type: JoinType,
    /// Joined table, entity or subquery
    pub source: TableSource,
    /// ON conditions, combined with AND
    pub on: Vec<Expr>,
}

impl Join {
    pub fn new(join_type: JoinType, source: TableSource, on: Vec<Expr>) -> Self {
        Self {
            join_type,
            source,
            on,
        }
    }

    /// Create an INNER JOIN on a raw table.
    pub fn inner(table: impl Into<String>, on: Expr) -> Self {
        Self::table(JoinType::Inner, table, vec![on])
    }

    /// Create a LEFT JOIN on a raw table.
    pub fn left(table: impl Into<String>, on: Expr) -> Self {
        Self::table(JoinType::Left, table, vec![on])
    }

    /// Create a CROSS JOIN on a raw table.
    pub fn cross(table: impl Into<String>) -> Self {
        Self::table(JoinType::Cross, table, Vec::new())
    }

    fn table(join_type: JoinType, table: impl Into<String>, on: Vec<Expr>) -> Self {
        let name = table.into();
        Self::new(
            join_type,
            TableSource::Table {
                alias: name.clone(),
                name,
            },
            on,
        )
    }

    /// Set an alias for the joined table.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        match &mut self.source {
            TableSource::Table { alias: a, .. }
            | TableSource::Entity { alias: a, .. }
            | TableSource::Subquery { alias: a, .. } => *a = alias,
        }
        self
    }

    /// Generate SQL and collect parameters.
    ///
    /// Every join but CROSS needs at least one condition.
    #[allow(clippy::result_large_err)]
    pub fn build_with_dialect(&self, dialect: Dialect, params: &mut Vec<Value>) -> Result<String> {
        let source_sql = self.source.build(dialect, params)?;
        let mut sql = format!(" {} {source_sql}", self.join_type.as_str());

        if self.join_type != JoinType::Cross {
            let Some(on) = Expr::all(self.on.iter().cloned()) else {
                return Err(Error::query(
                    QueryErrorKind::MissingJoinCondition,
                    format!("{} {} has no ON condition", self.join_type.as_str(), self.source.alias()),
                ));
            };
            sql.push_str(" ON ");
            sql.push_str(&on.build_with_dialect(dialect, params, 0));
        }

        Ok(sql)
    }
}
