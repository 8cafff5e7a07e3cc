//! Joinery - relation-aware query building and row hydration for Rust.
//!
//! Joinery maps explicitly registered entity types onto tables and provides:
//!
//! - Auto-join: JOIN conditions derived from declared relations, including
//!   many-to-many traversal through map tables and polymorphic morphs
//! - Auto-selection of every joined column under a collision-free name
//! - Regrouping of flat joined rows into nested rows per table alias
//! - Hydration of rows into entities through field casters
//!   (`CreatedTime`, `UuidCast`, `UuidBinCast`)
//!
//! # Quick Start
//!
//! ```ignore
//! use joinery::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Post {
//!     id: Option<i64>,
//!     title: String,
//!     author: Option<User>,
//! }
//!
//! impl Entity for Post {
//!     const TABLE_NAME: &'static str = "posts";
//!     const TABLE_ALIAS: &'static str = "p";
//!     const PRIMARY_KEY: &'static [&'static str] = &["id"];
//!
//!     fn fields() -> &'static [FieldInfo] {
//!         static FIELDS: &[FieldInfo] = &[FieldInfo::new("id").primary_key(true), FieldInfo::new("title")];
//!         FIELDS
//!     }
//!
//!     fn relations(registry: &mut RelationRegistry) {
//!         registry.register(Relation::many_to_one::<Post, User>("author").foreign_key("user_id", "id"));
//!     }
//!     // hydrate / extract / is_new / attach_relation ...
//! }
//!
//! async fn latest(cx: &Cx, conn: &impl Connection, orm: Arc<Orm>) -> Outcome<Vec<Post>, Error> {
//!     let query = match select!(orm, Post).left_join::<User>(None).group_by_joins(".") {
//!         Ok(query) => query,
//!         Err(e) => return Outcome::Err(e),
//!     };
//!     query.order_by(Expr::qualified("p", "id").desc()).all_as::<Post, _>(cx, conn).await
//! }
//! ```
//!
//! # Features
//!
//! - `uuid` (default): UUID generation and parsing for the UUID casters.
//!   Without it the casters fail with [`Error::Logic`].

pub use joinery_core::{
    CastContext, ColumnInfo, ConfigError, Connection, ConnectionError, ConnectionErrorKind,
    CreatedTime, Cx, DEFAULT_NULL_DATE, DatabaseAdapter, Dialect, Entity, EntityMetadata, Error,
    FieldCaster, FieldInfo, FromValue, GroupedRow, MapTable, MetadataRegistry, NULLABLE, Orm,
    OrmConfig, Outcome, QueryError, QueryErrorKind, Relation, RelationKind, RelationRegistry,
    Result, Row, RowEntry, SaveCast, SchemaIntrospector, StaticSchema, TableAware, TableRef,
    TypeError, UuidBinCast, UuidCast, UuidVersion, UuidWrapper, Value, ValueCast, resolve_time,
};

pub use joinery_query::{
    BinaryOp, Expr, FromGroupedRow, GroupingStage, Hydrator, Join, JoinResolution, JoinTarget,
    JoinType, Limit, NullsOrder, Offset, OrderBy, OrderDirection, Query, QueryProperty,
    RowPipeline, RowStage, SelectorQuery, TableSource, Where, group_item, raw_query, select,
};

/// Everything needed to declare entities and run queries.
pub mod prelude {
    pub use crate::{
        Connection, CreatedTime, Cx, DatabaseAdapter, Dialect, Entity, Error, Expr, FieldCaster,
        FieldInfo, FromValue, GroupedRow, JoinResolution, JoinType, NULLABLE, OrderBy, Orm,
        OrmConfig, Outcome, Relation, RelationRegistry, Result, Row, SaveCast, SchemaIntrospector,
        SelectorQuery, UuidBinCast, UuidCast, UuidVersion, Value, ValueCast, select,
    };
    pub use std::sync::Arc;
}
