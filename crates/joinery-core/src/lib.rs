//! Core types and traits for Joinery.
//!
//! This crate provides the foundations the query layer builds on:
//!
//! - `Value`, `Row` and `GroupedRow` for data moving to and from the driver
//! - `Entity` trait, `EntityMetadata` and `RelationRegistry` for mapping
//! - Field casters (`CreatedTime`, `UuidCast`, `UuidBinCast`)
//! - `Orm` for hydration and extraction
//! - `Connection`, `SchemaIntrospector` and `DatabaseAdapter` seams
//! - `Outcome` and `Cx` re-exported from asupersync

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod adapter;
pub mod cast;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod field;
pub mod grouped;
pub mod orm;
pub mod relation;
pub mod row;
pub mod uuid_wrapper;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{DEFAULT_NULL_DATE, DatabaseAdapter, SchemaIntrospector, StaticSchema};
pub use cast::{
    CastContext, CreatedTime, FieldCaster, NULLABLE, SaveCast, UuidBinCast, UuidCast, ValueCast,
    resolve_time,
};
pub use config::OrmConfig;
pub use connection::Connection;
pub use dialect::Dialect;
pub use entity::{Entity, EntityMetadata, MetadataRegistry, TableAware};
pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, Error, QueryError, QueryErrorKind, Result,
    TypeError,
};
pub use field::FieldInfo;
pub use grouped::{GroupedRow, RowEntry};
pub use orm::Orm;
pub use relation::{MapTable, Relation, RelationKind, RelationRegistry, TableRef};
pub use row::{ColumnInfo, FromValue, Row};
pub use uuid_wrapper::{UuidVersion, UuidWrapper};
pub use value::Value;
