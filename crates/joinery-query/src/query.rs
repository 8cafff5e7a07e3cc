//! Generic SELECT query builder.

use crate::clause::{Limit, Offset, OrderBy, Where};
use crate::expr::Expr;
use crate::join::{Join, JoinTarget, TableSource};
use asupersync::{Cx, Outcome};
use joinery_core::{Connection, Dialect, Error, QueryErrorKind, Result, Row, Value};

/// A SELECT query over one FROM source and any number of joins.
///
/// Select fragments are kept as raw SQL; [`select`](Self::select) quotes a
/// plain column, [`select_raw`](Self::select_raw) takes the text verbatim.
#[derive(Debug, Clone, Default)]
pub struct Query {
    dialect: Dialect,
    distinct: bool,
    columns: Vec<String>,
    from: Option<TableSource>,
    joins: Vec<Join>,
    where_clause: Option<Where>,
    order_by: Vec<OrderBy>,
    limit: Option<Limit>,
    offset: Option<Offset>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SQL dialect used by [`build`](Self::build).
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn get_dialect(&self) -> Dialect {
        self.dialect
    }

    /// Set the FROM source, replacing any earlier one.
    pub fn from(mut self, target: impl Into<JoinTarget>, alias: Option<&str>) -> Self {
        self.from = Some(target.into().into_source(alias, "sub0"));
        self
    }

    /// Add a join.
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Select a column. Dotted names are quoted part by part.
    pub fn select(mut self, column: &str) -> Self {
        self.columns.push(self.dialect.quote_name(column, false));
        self
    }

    /// Select a raw SQL fragment.
    pub fn select_raw(mut self, fragment: impl Into<String>) -> Self {
        self.columns.push(fragment.into());
        self
    }

    /// Add a WHERE condition, combined with AND.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(expr),
            None => Where::new(expr),
        });
        self
    }

    /// Add a WHERE condition, combined with OR.
    pub fn or_filter(mut self, expr: Expr) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.or(expr),
            None => Where::new(expr),
        });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(Limit(n));
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(Offset(n));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// The FROM source, if set.
    pub fn from_source(&self) -> Option<&TableSource> {
        self.from.as_ref()
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// FROM first, then every joined source, in declaration order.
    pub fn sources(&self) -> impl Iterator<Item = &TableSource> {
        self.from
            .iter()
            .chain(self.joins.iter().map(|join| &join.source))
    }

    pub fn source_count(&self) -> usize {
        usize::from(self.from.is_some()) + self.joins.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Build the SQL string and parameters.
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<(String, Vec<Value>)> {
        let mut params = Vec::new();
        let sql = self.build_into(self.dialect, &mut params)?;
        tracing::trace!(sql = %sql, params = params.len(), "built query");
        Ok((sql, params))
    }

    /// Build with `dialect`, appending parameters to `params`.
    ///
    /// Placeholders continue from the parameters already present, so a
    /// subquery can be built into its parent.
    #[allow(clippy::result_large_err)]
    pub fn build_into(&self, dialect: Dialect, params: &mut Vec<Value>) -> Result<String> {
        let Some(from) = &self.from else {
            return Err(Error::query(
                QueryErrorKind::MissingFrom,
                "query has no FROM source",
            ));
        };

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&from.build(dialect, params)?);

        for join in &self.joins {
            let join_sql = join.build_with_dialect(dialect, params).map_err(|e| {
                tracing::debug!(alias = join.source.alias(), error = %e, "join rejected");
                e
            })?;
            sql.push_str(&join_sql);
        }

        if let Some(where_clause) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause.build(dialect, params, 0));
        }

        if !self.order_by.is_empty() {
            let order_strs: Vec<_> = self
                .order_by
                .iter()
                .map(|o| o.build(dialect, params, 0))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_strs.join(", "));
        }

        if let Some(Limit(n)) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        if let Some(Offset(n)) = self.offset {
            sql.push_str(&format!(" OFFSET {n}"));
        }

        Ok(sql)
    }

    /// Execute the query and return the raw rows.
    pub async fn all<C: Connection>(&self, cx: &Cx, conn: &C) -> Outcome<Vec<Row>, Error> {
        let (sql, params) = match self.build() {
            Ok(built) => built,
            Err(e) => return Outcome::Err(e),
        };
        conn.query(cx, &sql, &params).await
    }
}
