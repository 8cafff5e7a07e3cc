//! Entity-aware SELECT queries.
//!
//! [`SelectorQuery`] wraps a [`Query`] with an [`Orm`] handle and adds:
//!
//! - auto-join: a join on an entity without ON conditions is completed from
//!   the FROM entity's relations
//! - auto-selection: every column of every source selected under a
//!   collision-free output name
//! - row grouping and hydration of fetched rows
//!
//! # Example
//!
//! ```ignore
//! let posts = SelectorQuery::new(orm.clone())
//!     .from_entity::<Post>(None)
//!     .left_join::<User>(None)
//!     .group_by_joins(".")?
//!     .all_as::<Post, _>(&cx, &conn)
//!     .await;
//! // SELECT "p"."id" AS "id", ..., "u"."id" AS "u.id", ...
//! //   FROM "posts" AS "p" LEFT JOIN "users" AS "u" ON "p"."user_id" = "u"."id"
//! ```

use crate::clause::OrderBy;
use crate::expr::Expr;
use crate::join::{Join, JoinTarget, JoinType, TableSource};
use crate::pipeline::{FromGroupedRow, GroupingStage, Hydrator, RowPipeline, RowStage};
use crate::query::Query;
use asupersync::{Cx, Outcome};
use joinery_core::{
    Connection, DatabaseAdapter, Entity, EntityMetadata, Error, GroupedRow, Orm, Relation, Result,
    Row, TableRef,
};
use std::fmt;
use std::sync::Arc;

/// Outcome of looking up the join conditions for an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinResolution {
    /// The first matching relation and the conditions built from it.
    Resolved {
        relation: Relation,
        conditions: Vec<Expr>,
    },
    /// The FROM entity has no relation leading to the target.
    NoRelation,
    /// The query has no FROM source to start from.
    NoFrom,
}

impl JoinResolution {
    /// The synthesized conditions; empty unless resolved.
    pub fn into_conditions(self) -> Vec<Expr> {
        match self {
            JoinResolution::Resolved { conditions, .. } => conditions,
            JoinResolution::NoRelation | JoinResolution::NoFrom => Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, JoinResolution::Resolved { .. })
    }
}

/// What [`SelectorQuery::property`] hands back.
#[derive(Clone, Copy)]
pub enum QueryProperty<'a> {
    Db(&'a dyn DatabaseAdapter),
    Orm(&'a Orm),
}

impl fmt::Debug for QueryProperty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryProperty::Db(_) => f.write_str("Db"),
            QueryProperty::Orm(orm) => f.debug_tuple("Orm").field(orm).finish(),
        }
    }
}

/// A SELECT query bound to an [`Orm`].
///
/// Cloning gives an independent query: the clone owns its grouping divider
/// and stage list, so changes to one never reach the other.
#[derive(Clone)]
pub struct SelectorQuery {
    orm: Arc<Orm>,
    query: Query,
    divider: Option<String>,
    stages: Vec<Arc<dyn RowStage>>,
}

impl SelectorQuery {
    /// Create an empty query using the ORM's dialect.
    pub fn new(orm: Arc<Orm>) -> Self {
        let query = Query::new().dialect(orm.dialect());
        Self {
            orm,
            query,
            divider: None,
            stages: Vec::new(),
        }
    }

    /// A fresh query bound to the same ORM.
    pub fn create_sub_query(&self) -> Self {
        Self::new(Arc::clone(&self.orm))
    }

    /// The database adapter.
    pub fn db(&self) -> &dyn DatabaseAdapter {
        self.orm.adapter()
    }

    pub fn orm(&self) -> &Orm {
        &self.orm
    }

    /// Look up `db` or `orm` by name.
    #[allow(clippy::result_large_err)]
    pub fn property(&self, name: &str) -> Result<QueryProperty<'_>> {
        match name {
            "db" => Ok(QueryProperty::Db(self.db())),
            "orm" => Ok(QueryProperty::Orm(self.orm())),
            _ => Err(Error::InvalidArgument(format!(
                "Property {name} is undefined in SelectorQuery"
            ))),
        }
    }

    /// The underlying query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    /// Metadata of the FROM entity, if the query starts from one.
    pub fn from_metadata(&self) -> Option<&Arc<EntityMetadata>> {
        self.query.from_source().and_then(TableSource::metadata)
    }

    // ==================== Sources ====================

    /// Set the FROM source.
    pub fn from(mut self, target: impl Into<JoinTarget>, alias: Option<&str>) -> Self {
        self.query = self.query.from(target, alias);
        self
    }

    /// FROM the table of entity `E`.
    pub fn from_entity<E: Entity>(self, alias: Option<&str>) -> Self {
        let metadata = self.orm.metadata::<E>();
        self.from(metadata, alias)
    }

    /// Add a join.
    ///
    /// With explicit `on` conditions this is a plain join. Without them, an
    /// entity target gets its conditions from the first matching relation
    /// of the FROM entity (see [`resolve_join`](Self::resolve_join)). When
    /// nothing matches the join keeps an empty condition set, which the
    /// query rejects when it is built.
    pub fn join(
        mut self,
        join_type: JoinType,
        target: impl Into<JoinTarget>,
        alias: Option<&str>,
        on: Vec<Expr>,
    ) -> Self {
        let target = target.into();
        let fallback = format!("sub{}", self.query.source_count());
        let source = target.into_source(alias, &fallback);

        let on = match (&source, on.is_empty()) {
            (TableSource::Entity { metadata, alias }, true) => {
                match self.resolve(&metadata.table_ref(), alias) {
                    JoinResolution::Resolved {
                        relation,
                        conditions,
                    } => {
                        tracing::debug!(
                            relation = %relation.name,
                            target = metadata.table,
                            alias = %alias,
                            conditions = conditions.len(),
                            "auto-join resolved"
                        );
                        conditions
                    }
                    unresolved => {
                        tracing::debug!(
                            target = metadata.table,
                            alias = %alias,
                            resolution = ?unresolved,
                            "auto-join found no relation"
                        );
                        Vec::new()
                    }
                }
            }
            _ => on,
        };

        self.query = self.query.join(Join::new(join_type, source, on));
        self
    }

    /// Join entity `E`, resolving conditions from relations.
    pub fn join_entity<E: Entity>(self, join_type: JoinType, alias: Option<&str>) -> Self {
        let metadata = self.orm.metadata::<E>();
        self.join(join_type, metadata, alias, Vec::new())
    }

    pub fn inner_join<E: Entity>(self, alias: Option<&str>) -> Self {
        self.join_entity::<E>(JoinType::Inner, alias)
    }

    pub fn left_join<E: Entity>(self, alias: Option<&str>) -> Self {
        self.join_entity::<E>(JoinType::Left, alias)
    }

    pub fn right_join<E: Entity>(self, alias: Option<&str>) -> Self {
        self.join_entity::<E>(JoinType::Right, alias)
    }

    /// The conditions auto-join would build for `E` under `alias`
    /// (default: `E`'s table alias).
    pub fn resolve_join<E: Entity>(&self, alias: Option<&str>) -> JoinResolution {
        let target = TableRef::of::<E>();
        self.resolve(&target, alias.unwrap_or(target.alias))
    }

    fn resolve(&self, target: &TableRef, alias: &str) -> JoinResolution {
        let Some(from) = self.query.from_source() else {
            return JoinResolution::NoFrom;
        };
        let Some(from_meta) = from.metadata() else {
            return JoinResolution::NoRelation;
        };
        let from_alias = from.alias();

        from_meta
            .relations
            .relations()
            .iter()
            .find_map(|relation| {
                relation_conditions(relation, target, from_alias, alias).map(|conditions| {
                    JoinResolution::Resolved {
                        relation: relation.clone(),
                        conditions,
                    }
                })
            })
            .unwrap_or(JoinResolution::NoRelation)
    }

    // ==================== Selection ====================

    /// Select a column.
    pub fn select(mut self, column: &str) -> Self {
        self.query = self.query.select(column);
        self
    }

    /// Select a raw SQL fragment.
    pub fn select_raw(mut self, fragment: impl Into<String>) -> Self {
        self.query = self.query.select_raw(fragment);
        self
    }

    /// Select every column of every source under a distinct output name.
    ///
    /// Columns of the FROM source keep their name; columns of joined
    /// sources are named `<alias><divider><column>`. Subqueries are skipped.
    #[allow(clippy::result_large_err)]
    pub fn auto_selections(self, divider: &str) -> Result<Self> {
        let mut columns = Vec::new();
        self.auto_selections_into(divider, &mut columns)
    }

    /// Like [`auto_selections`](Self::auto_selections), also recording
    /// `<alias><divider><column>` for every generated column in `columns`.
    #[allow(clippy::result_large_err)]
    pub fn auto_selections_into(mut self, divider: &str, columns: &mut Vec<String>) -> Result<Self> {
        let dialect = self.query.get_dialect();
        let mut fragments = Vec::new();

        for (i, source) in self.query.sources().enumerate() {
            let Some(table) = source.table_name() else {
                continue;
            };
            let alias = source.alias();

            for column in self.orm.adapter().column_names(table)? {
                let output = if i == 0 {
                    column.clone()
                } else {
                    format!("{alias}{divider}{column}")
                };
                columns.push(format!("{alias}{divider}{column}"));
                fragments.push(format!(
                    "{} AS {}",
                    dialect.quote_name(&format!("{alias}.{column}"), false),
                    dialect.quote_name(&output, true)
                ));
            }
        }

        tracing::trace!(columns = fragments.len(), "auto selections");
        for fragment in fragments {
            self.query = self.query.select_raw(fragment);
        }
        Ok(self)
    }

    // ==================== Filtering ====================

    pub fn filter(mut self, expr: Expr) -> Self {
        self.query = self.query.filter(expr);
        self
    }

    pub fn or_filter(mut self, expr: Expr) -> Self {
        self.query = self.query.or_filter(expr);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.query = self.query.order_by(order);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.query = self.query.limit(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.query = self.query.offset(n);
        self
    }

    // ==================== Row processing ====================

    /// Group fetched rows by `divider`; `None` turns grouping off.
    pub fn group_by_divider(mut self, divider: Option<&str>) -> Self {
        self.divider = divider.map(str::to_string);
        self
    }

    /// [`auto_selections`](Self::auto_selections) plus grouping with the
    /// same divider.
    #[allow(clippy::result_large_err)]
    pub fn group_by_joins(self, divider: &str) -> Result<Self> {
        Ok(self.auto_selections(divider)?.group_by_divider(Some(divider)))
    }

    pub fn divider(&self) -> Option<&str> {
        self.divider.as_deref()
    }

    /// The divider from the ORM's configuration.
    pub fn default_divider(&self) -> &str {
        &self.orm.config().group_divider
    }

    /// [`auto_selections`](Self::auto_selections) with the configured
    /// divider.
    #[allow(clippy::result_large_err)]
    pub fn auto_selections_default(self) -> Result<Self> {
        let divider = self.default_divider().to_string();
        self.auto_selections(&divider)
    }

    /// [`group_by_joins`](Self::group_by_joins) with the configured divider.
    #[allow(clippy::result_large_err)]
    pub fn group_by_joins_default(self) -> Result<Self> {
        let divider = self.default_divider().to_string();
        self.group_by_joins(&divider)
    }

    /// Append a stage run on every fetched row after grouping.
    pub fn with_stage(mut self, stage: Arc<dyn RowStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// The stages for one fetch: grouping, if enabled, then the added
    /// stages.
    pub fn pipeline(&self) -> RowPipeline {
        let mut pipeline = RowPipeline::new();
        if let Some(divider) = &self.divider {
            pipeline = pipeline.stage(Arc::new(GroupingStage::new(divider.as_str())));
        }
        self.stages
            .iter()
            .fold(pipeline, |pipeline, stage| pipeline.stage(Arc::clone(stage)))
    }

    /// Run `rows` through the pipeline into `T`. Dropped rows are skipped.
    #[allow(clippy::result_large_err)]
    pub fn process_rows<T: FromGroupedRow>(&self, rows: Vec<Row>) -> Result<Vec<T>> {
        let pipeline = self.pipeline();
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(row) = pipeline.run(Some(GroupedRow::from(row)))? {
                items.push(T::from_grouped_row(&self.orm, row)?);
            }
        }
        Ok(items)
    }

    /// Run `rows` through the pipeline and hydrate each into an `E`.
    #[allow(clippy::result_large_err)]
    pub fn process_rows_as<E: Entity>(&self, rows: Vec<Row>) -> Result<Vec<E>> {
        let pipeline = self.pipeline();
        let hydrator = Hydrator::<E>::new(Arc::clone(&self.orm));
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(entity) = hydrator.hydrate(pipeline.run(Some(GroupedRow::from(row)))?)? {
                items.push(entity);
            }
        }
        Ok(items)
    }

    // ==================== Execution ====================

    /// Build the SQL string and parameters.
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<(String, Vec<joinery_core::Value>)> {
        self.query.build()
    }

    /// Execute the query and return all processed rows.
    #[tracing::instrument(level = "debug", skip(self, cx, conn))]
    pub async fn all<C: Connection>(&self, cx: &Cx, conn: &C) -> Outcome<Vec<GroupedRow>, Error> {
        self.fetch(cx, conn)
            .await
            .and_then(|rows| match self.process_rows(rows) {
                Ok(items) => Outcome::Ok(items),
                Err(e) => Outcome::Err(e),
            })
    }

    /// Execute the query and return the first processed row.
    pub async fn first<C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
    ) -> Outcome<Option<GroupedRow>, Error> {
        let query = self.clone().limit(1);
        query
            .all(cx, conn)
            .await
            .map(|rows| rows.into_iter().next())
    }

    /// Execute the query and hydrate every row into an `E`.
    #[tracing::instrument(level = "debug", skip(self, cx, conn), fields(entity = std::any::type_name::<E>()))]
    pub async fn all_as<E: Entity, C: Connection>(&self, cx: &Cx, conn: &C) -> Outcome<Vec<E>, Error> {
        self.fetch(cx, conn)
            .await
            .and_then(|rows| match self.process_rows_as::<E>(rows) {
                Ok(items) => Outcome::Ok(items),
                Err(e) => Outcome::Err(e),
            })
    }

    /// Execute the query and hydrate the first row into an `E`.
    pub async fn first_as<E: Entity, C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
    ) -> Outcome<Option<E>, Error> {
        let query = self.clone().limit(1);
        query
            .all_as::<E, C>(cx, conn)
            .await
            .map(|items| items.into_iter().next())
    }

    async fn fetch<C: Connection>(&self, cx: &Cx, conn: &C) -> Outcome<Vec<Row>, Error> {
        let (sql, params) = match self.build() {
            Ok(built) => built,
            Err(e) => return Outcome::Err(e),
        };
        tracing::debug!(sql = %sql, params = params.len(), "executing select");
        let rows = conn.query(cx, &sql, &params).await;
        if let Outcome::Ok(rows) = &rows {
            tracing::trace!(rows = rows.len(), "fetched rows");
        }
        rows
    }
}

/// Conditions joining `target` under `alias`, if `relation` leads there.
fn relation_conditions(
    relation: &Relation,
    target: &TableRef,
    from_alias: &str,
    alias: &str,
) -> Option<Vec<Expr>> {
    let mut on = Vec::new();

    if let Some(map) = &relation.map {
        if map.table.entity == target.entity {
            for (source_key, map_key) in &map.foreign_keys {
                on.push(Expr::qualified(from_alias, source_key).eq(Expr::qualified(alias, map_key)));
            }
            for (column, value) in &map.morphs {
                on.push(Expr::qualified(alias, column).eq(Expr::lit(value.clone())));
            }
            return Some(on);
        }

        if relation.target.entity == target.entity {
            let map_alias = map.table.alias;
            for (map_key, target_key) in &relation.foreign_keys {
                on.push(Expr::qualified(map_alias, map_key).eq(Expr::qualified(alias, target_key)));
            }
            push_morphs(&mut on, relation, alias);
            return Some(on);
        }

        return None;
    }

    if relation.target.entity != target.entity {
        return None;
    }
    for (source_key, target_key) in &relation.foreign_keys {
        on.push(Expr::qualified(from_alias, source_key).eq(Expr::qualified(alias, target_key)));
    }
    push_morphs(&mut on, relation, alias);
    Some(on)
}

fn push_morphs(on: &mut Vec<Expr>, relation: &Relation, alias: &str) {
    for (column, value) in &relation.morphs {
        on.push(Expr::qualified(alias, column).eq(Expr::lit(value.clone())));
    }
}

impl fmt::Debug for SelectorQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorQuery")
            .field("query", &self.query)
            .field("divider", &self.divider)
            .field("stages", &self.stages.len())
            .finish_non_exhaustive()
    }
}
