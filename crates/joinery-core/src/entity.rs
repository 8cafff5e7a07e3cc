//! Entity trait and per-entity metadata.
//!
//! An entity is a Rust struct bound to a table. There is no reflection: the
//! struct describes its table, fields and relations through [`Entity`], and
//! the [`Orm`](crate::Orm) turns that into shared [`EntityMetadata`].

use crate::Result;
use crate::field::FieldInfo;
use crate::grouped::GroupedRow;
use crate::relation::{Relation, RelationRegistry, TableRef};
use crate::value::Value;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Trait for types that are mapped to database tables.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Default)]
/// struct Post {
///     id: Option<i64>,
///     title: String,
///     author: Option<User>,
/// }
///
/// impl Entity for Post {
///     const TABLE_NAME: &'static str = "posts";
///     const TABLE_ALIAS: &'static str = "p";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///
///     fn fields() -> &'static [FieldInfo] {
///         static FIELDS: &[FieldInfo] = &[FieldInfo::new("id").primary_key(true), FieldInfo::new("title")];
///         FIELDS
///     }
///
///     fn relations(registry: &mut RelationRegistry) {
///         registry.register(Relation::many_to_one::<Post, User>("author").foreign_key("user_id", "id"));
///     }
///     // hydrate / extract / is_new / attach_relation ...
/// }
/// ```
pub trait Entity: Default + Send + Sync + 'static {
    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// The alias the table gets in queries.
    const TABLE_ALIAS: &'static str = Self::TABLE_NAME;

    /// The primary key column name(s). Empty for keyless tables.
    const PRIMARY_KEY: &'static [&'static str] = &[];

    /// Get field metadata for all columns.
    fn fields() -> &'static [FieldInfo];

    /// Declare relations to other entities. Called once per entity.
    fn relations(_registry: &mut RelationRegistry) {}

    /// An empty instance to hydrate into.
    fn create() -> Self {
        Self::default()
    }

    /// Copy column values from `row` into `self`.
    ///
    /// Values have already been through the field casters.
    #[allow(clippy::result_large_err)]
    fn hydrate(&mut self, row: &GroupedRow) -> Result<()>;

    /// The current column values, before casters.
    fn extract(&self) -> Vec<(&'static str, Value)>;

    /// Whether this instance has not been stored yet.
    fn is_new(&self) -> bool;

    /// Receive the nested data of a joined relation.
    ///
    /// The default ignores it.
    #[allow(clippy::result_large_err)]
    fn attach_relation(&mut self, _relation: &Relation, _data: &GroupedRow) -> Result<()> {
        Ok(())
    }
}

/// Types that know their table name.
pub trait TableAware {
    fn table() -> &'static str;
}

impl<E: Entity> TableAware for E {
    fn table() -> &'static str {
        E::TABLE_NAME
    }
}

/// Everything the ORM knows about one entity type.
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    /// Identity of the entity type; used for matching.
    pub type_id: TypeId,
    /// Rust type name of the entity, for diagnostics.
    pub key: &'static str,
    pub table: &'static str,
    pub alias: &'static str,
    /// Primary key columns.
    pub main_key: Vec<&'static str>,
    pub fields: &'static [FieldInfo],
    pub relations: RelationRegistry,
}

impl EntityMetadata {
    /// Collect the metadata of `E`, running its relation registration.
    pub fn of<E: Entity>() -> Self {
        let fields = E::fields();
        let main_key = if E::PRIMARY_KEY.is_empty() {
            fields
                .iter()
                .filter(|f| f.primary_key)
                .map(|f| f.column)
                .collect()
        } else {
            E::PRIMARY_KEY.to_vec()
        };

        let mut relations = RelationRegistry::new();
        E::relations(&mut relations);

        Self {
            type_id: TypeId::of::<E>(),
            key: std::any::type_name::<E>(),
            table: E::TABLE_NAME,
            alias: E::TABLE_ALIAS,
            main_key,
            fields,
            relations,
        }
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef {
            entity: self.type_id,
            table: self.table,
            alias: self.alias,
        }
    }

    pub fn has_main_key(&self) -> bool {
        !self.main_key.is_empty()
    }

    pub fn is_key_column(&self, column: &str) -> bool {
        self.main_key.contains(&column)
    }

    /// Find a field by its column name.
    pub fn field(&self, column: &str) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|f| f.column == column)
    }
}

/// Metadata of every registered entity, keyed by type.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: RwLock<HashMap<TypeId, Arc<EntityMetadata>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `E`, replacing earlier metadata for the same type.
    pub fn register<E: Entity>(&self) -> Arc<EntityMetadata> {
        let metadata = Arc::new(EntityMetadata::of::<E>());
        tracing::debug!(
            entity = metadata.key,
            table = metadata.table,
            relations = metadata.relations.len(),
            "registered entity"
        );
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(metadata.type_id, Arc::clone(&metadata));
        metadata
    }

    /// Registered metadata of `E`, if any.
    pub fn get<E: Entity>(&self) -> Option<Arc<EntityMetadata>> {
        self.get_by_type(TypeId::of::<E>())
    }

    pub fn get_by_type(&self, type_id: TypeId) -> Option<Arc<EntityMetadata>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&type_id)
            .cloned()
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
