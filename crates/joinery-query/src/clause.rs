//! SQL clause types (WHERE, ORDER BY, LIMIT, OFFSET).

use crate::expr::Expr;
use joinery_core::{Dialect, Value};

/// WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    expr: Expr,
}

impl Where {
    /// Create a new WHERE clause with the given expression.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// Add an AND condition.
    pub fn and(self, expr: Expr) -> Self {
        Self {
            expr: self.expr.and(expr),
        }
    }

    /// Add an OR condition.
    pub fn or(self, expr: Expr) -> Self {
        Self {
            expr: self.expr.or(expr),
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Build the WHERE clause SQL, appending to `params`.
    pub fn build(&self, dialect: Dialect, params: &mut Vec<Value>, offset: usize) -> String {
        self.expr.build_with_dialect(dialect, params, offset)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// NULLS FIRST/LAST ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// ORDER BY clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: OrderDirection,
    pub nulls: Option<NullsOrder>,
}

impl OrderBy {
    pub fn new(expr: Expr, direction: OrderDirection) -> Self {
        Self {
            expr,
            direction,
            nulls: None,
        }
    }

    /// Ascending order on a column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(Expr::col(column), OrderDirection::Asc)
    }

    /// Descending order on a column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(Expr::col(column), OrderDirection::Desc)
    }

    #[must_use]
    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    #[must_use]
    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    pub fn build(&self, dialect: Dialect, params: &mut Vec<Value>, offset: usize) -> String {
        let expr_sql = self.expr.build_with_dialect(dialect, params, offset);
        let dir = match self.direction {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        };
        let nulls = match self.nulls {
            Some(NullsOrder::First) => " NULLS FIRST",
            Some(NullsOrder::Last) => " NULLS LAST",
            None => "",
        };
        format!("{expr_sql} {dir}{nulls}")
    }
}

/// LIMIT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(pub u64);

/// OFFSET clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_chaining() {
        let clause = Where::new(Expr::col("a").eq(1)).and(Expr::col("b").eq(2));
        let mut params = Vec::new();
        let sql = clause.build(Dialect::Postgres, &mut params, 0);
        assert_eq!(sql, "\"a\" = $1 AND \"b\" = $2");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_order_by() {
        let mut params = Vec::new();
        assert_eq!(
            OrderBy::desc("created").nulls_last().build(Dialect::Postgres, &mut params, 0),
            "\"created\" DESC NULLS LAST"
        );
        assert_eq!(
            Expr::qualified("p", "id").asc().build(Dialect::Mysql, &mut params, 0),
            "`p`.`id` ASC"
        );
    }
}
