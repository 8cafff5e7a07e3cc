//! The ORM handle: metadata, hydration and extraction.

use crate::Result;
use crate::adapter::DatabaseAdapter;
use crate::cast::CastContext;
use crate::config::OrmConfig;
use crate::dialect::Dialect;
use crate::entity::{Entity, EntityMetadata, MetadataRegistry};
use crate::error::Error;
use crate::field::FieldInfo;
use crate::grouped::{GroupedRow, RowEntry};
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Ties entity metadata to a database adapter.
///
/// An `Orm` is usually created once and shared behind an `Arc` by every
/// query built from it.
pub struct Orm {
    adapter: Arc<dyn DatabaseAdapter>,
    config: OrmConfig,
    registry: MetadataRegistry,
}

impl Orm {
    pub fn new(adapter: Arc<dyn DatabaseAdapter>) -> Self {
        Self::with_config(adapter, OrmConfig::default())
    }

    pub fn with_config(adapter: Arc<dyn DatabaseAdapter>, config: OrmConfig) -> Self {
        Self {
            adapter,
            config,
            registry: MetadataRegistry::new(),
        }
    }

    pub fn adapter(&self) -> &dyn DatabaseAdapter {
        self.adapter.as_ref()
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Register `E` so its metadata is built once and shared.
    pub fn register<E: Entity>(&self) -> Arc<EntityMetadata> {
        self.registry.register::<E>()
    }

    /// Metadata of `E`.
    ///
    /// Registered entities get their shared copy; others get fresh metadata
    /// built on the spot.
    pub fn metadata<E: Entity>(&self) -> Arc<EntityMetadata> {
        self.registry
            .get::<E>()
            .unwrap_or_else(|| Arc::new(EntityMetadata::of::<E>()))
    }

    /// Whether `T` has been registered as an entity.
    pub fn is_entity<T: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(std::any::TypeId::of::<T>())
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    fn cast_context(&self, meta: &EntityMetadata, field: &FieldInfo, is_new: bool) -> CastContext<'_> {
        CastContext {
            orm: self,
            is_new,
            entity_has_key: meta.has_main_key(),
            field_is_key: field.primary_key || meta.is_key_column(field.column),
        }
    }

    /// Build a new `E` from `row`.
    #[allow(clippy::result_large_err)]
    pub fn hydrate<E: Entity>(&self, row: &GroupedRow) -> Result<E> {
        let mut entity = E::create();
        self.hydrate_into(&mut entity, row)?;
        Ok(entity)
    }

    /// Fill an existing `entity` from `row`.
    ///
    /// Field casters run first, then [`Entity::hydrate`], then nested groups
    /// are attached to their relations.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "trace", skip(self, entity, row), fields(entity = std::any::type_name::<E>()))]
    pub fn hydrate_into<E: Entity>(&self, entity: &mut E, row: &GroupedRow) -> Result<()> {
        let meta = self.metadata::<E>();
        self.hydrate_with(&meta, entity, row)
    }

    /// [`hydrate_into`](Self::hydrate_into) with metadata resolved by the
    /// caller, for hydrating many rows of one type.
    #[allow(clippy::result_large_err)]
    pub fn hydrate_with<E: Entity>(
        &self,
        meta: &EntityMetadata,
        entity: &mut E,
        row: &GroupedRow,
    ) -> Result<()> {
        if meta.type_id != std::any::TypeId::of::<E>() {
            return Err(Error::Metadata(format!(
                "metadata of {} used to hydrate {}",
                meta.key,
                std::any::type_name::<E>()
            )));
        }
        let is_new = entity.is_new();

        let mut casted = row.clone();
        for field in meta.fields {
            let Some(mut value) = casted.value(field.column).cloned() else {
                continue;
            };
            let ctx = self.cast_context(meta, field, is_new);
            for cast in field.value_casters() {
                value = cast.hydrate(&value, &ctx)?;
            }
            casted.insert(field.column, value);
        }

        entity.hydrate(&casted)?;
        self.attach_relations(entity, meta, &casted)
    }

    #[allow(clippy::result_large_err)]
    fn attach_relations<E: Entity>(
        &self,
        entity: &mut E,
        meta: &EntityMetadata,
        row: &GroupedRow,
    ) -> Result<()> {
        let mut consumed = HashSet::new();
        for relation in meta.relations.relations() {
            let alias = relation.target.alias;
            // Joins resolve to the first relation per alias; the group
            // belongs to that one only.
            if !consumed.insert(alias) {
                continue;
            }
            let Some(data) = row.nested(alias) else {
                continue;
            };
            if is_all_null(data) {
                tracing::trace!(relation = %relation.name, "skipping empty relation group");
                continue;
            }
            tracing::trace!(relation = %relation.name, alias, "attaching relation");
            entity.attach_relation(relation, data)?;
        }
        Ok(())
    }

    /// The entity's column values after read/write casters.
    #[allow(clippy::result_large_err)]
    pub fn extract<E: Entity>(&self, entity: &E) -> Result<Vec<(&'static str, Value)>> {
        let meta = self.metadata::<E>();
        let is_new = entity.is_new();
        self.extract_with(entity, &meta, is_new)
    }

    /// The column values to store: [`extract`](Self::extract) followed by
    /// every save caster.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "trace", skip(self, entity), fields(entity = std::any::type_name::<E>()))]
    pub fn extract_for_save<E: Entity>(
        &self,
        entity: &E,
        is_new: bool,
    ) -> Result<Vec<(&'static str, Value)>> {
        let meta = self.metadata::<E>();
        let mut values = self.extract_with(entity, &meta, is_new)?;
        for (column, value) in &mut values {
            let Some(field) = meta.field(*column) else {
                continue;
            };
            let ctx = self.cast_context(&meta, field, is_new);
            for cast in field.save_casters() {
                *value = cast.cast_for_save(std::mem::replace(value, Value::Null), &ctx)?;
            }
        }
        Ok(values)
    }

    #[allow(clippy::result_large_err)]
    fn extract_with<E: Entity>(
        &self,
        entity: &E,
        meta: &EntityMetadata,
        is_new: bool,
    ) -> Result<Vec<(&'static str, Value)>> {
        let mut values = entity.extract();
        for (column, value) in &mut values {
            let Some(field) = meta.field(*column) else {
                continue;
            };
            let ctx = self.cast_context(meta, field, is_new);
            for cast in field.value_casters() {
                *value = cast.extract(value, &ctx)?;
            }
        }
        Ok(values)
    }
}

fn is_all_null(row: &GroupedRow) -> bool {
    row.iter().all(|(_, entry)| match entry {
        RowEntry::Value(v) => v.is_null(),
        RowEntry::Nested(n) => is_all_null(n),
    })
}

impl fmt::Debug for Orm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orm")
            .field("config", &self.config)
            .field("entities", &self.registry.len())
            .finish_non_exhaustive()
    }
}
