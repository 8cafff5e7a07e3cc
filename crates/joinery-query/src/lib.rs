//! Relation-aware SQL query builder for Joinery.
//!
//! `joinery-query` is the **query construction layer**. It turns entity
//! metadata from `joinery-core` into SQL plus parameters and turns fetched
//! rows back into nested rows or entities.
//!
//! # Role In The Architecture
//!
//! - **Expression DSL**: `Expr` and clauses build ON/WHERE/ORDER BY safely.
//! - **Query**: a generic SELECT over tables, entities and subqueries.
//! - **SelectorQuery**: auto-join from declared relations, auto-selection of
//!   aliased columns, grouping and hydration of fetched rows.
//!
//! Queries execute through the `Connection` trait from `joinery-core`.
//! Most users access these builders via the `joinery` facade crate.

pub mod clause;
pub mod expr;
pub mod grouping;
pub mod join;
pub mod pipeline;
pub mod query;
pub mod selector;

pub use clause::{Limit, NullsOrder, Offset, OrderBy, OrderDirection, Where};
pub use expr::{BinaryOp, Expr};
pub use grouping::group_item;
pub use join::{Join, JoinTarget, JoinType, TableSource};
pub use pipeline::{FromGroupedRow, GroupingStage, Hydrator, RowPipeline, RowStage};
pub use query::Query;
pub use selector::{JoinResolution, QueryProperty, SelectorQuery};

use asupersync::{Cx, Outcome};
use joinery_core::{Connection, Row, Value};

/// Create a `SelectorQuery` selecting from an entity.
///
/// # Example
///
/// ```ignore
/// let posts = select!(orm, Post)
///     .left_join::<User>(None)
///     .group_by_joins(".")?
///     .all_as::<Post, _>(&cx, &conn)
///     .await;
/// ```
#[macro_export]
macro_rules! select {
    ($orm:expr, $entity:ty) => {
        $crate::SelectorQuery::new(::std::sync::Arc::clone(&$orm)).from_entity::<$entity>(None)
    };
    ($orm:expr, $entity:ty, $alias:expr) => {
        $crate::SelectorQuery::new(::std::sync::Arc::clone(&$orm))
            .from_entity::<$entity>(Some($alias))
    };
}

/// Raw SQL query execution.
///
/// For queries that can't be expressed with the builder.
pub async fn raw_query<C: Connection>(
    cx: &Cx,
    conn: &C,
    sql: &str,
    params: &[Value],
) -> Outcome<Vec<Row>, joinery_core::Error> {
    conn.query(cx, sql, params).await
}
