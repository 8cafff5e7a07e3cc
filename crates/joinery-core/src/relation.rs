//! Relation metadata between entities.
//!
//! Each entity declares its relations once, in [`Entity::relations`]. The
//! resulting [`RelationRegistry`] is read-only afterwards and is what the
//! query builder consults when a join is requested without explicit
//! conditions.

use crate::entity::Entity;
use crate::value::Value;
use indexmap::IndexMap;
use std::any::TypeId;

/// The type of relation between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// One-to-one: a `User` has one `Profile`.
    OneToOne,
    /// Many-to-one: many `Post`s belong to one `User`.
    ManyToOne,
    /// One-to-many: one `Post` has many `Comment`s.
    OneToMany,
    /// Many-to-many: `Post`s have many `Tag`s via a map table.
    ManyToMany,
}

impl RelationKind {
    /// Relations that join the target directly, without a map table.
    pub const fn is_direct(self) -> bool {
        !matches!(self, RelationKind::ManyToMany)
    }
}

/// Identifies an entity's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    /// Identity of the entity type; used for matching.
    pub entity: TypeId,
    /// Table name.
    pub table: &'static str,
    /// Default alias used when the table takes part in a query.
    pub alias: &'static str,
}

impl TableRef {
    /// The table of entity `E`.
    pub fn of<E: Entity>() -> Self {
        Self {
            entity: TypeId::of::<E>(),
            table: E::TABLE_NAME,
            alias: E::TABLE_ALIAS,
        }
    }

    /// Does this reference point at entity `E`?
    pub fn is<E: Entity>(&self) -> bool {
        self.entity == TypeId::of::<E>()
    }
}

/// The mapping table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq)]
pub struct MapTable {
    pub table: TableRef,
    /// Pairs of (source column, map column).
    pub foreign_keys: Vec<(String, String)>,
    /// Fixed column values the map row must carry.
    pub morphs: IndexMap<String, Value>,
}

/// A relation from one entity to another.
///
/// For direct relations `foreign_keys` pairs a source column with a target
/// column. For many-to-many relations it pairs a map column with a target
/// column, while [`MapTable::foreign_keys`] links source and map.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Property name the related data is attached to.
    pub name: String,
    pub kind: RelationKind,
    pub source: TableRef,
    pub target: TableRef,
    pub foreign_keys: Vec<(String, String)>,
    /// Fixed column values the target row must carry (polymorphic relations).
    pub morphs: IndexMap<String, Value>,
    pub map: Option<MapTable>,
}

impl Relation {
    fn direct<S: Entity, T: Entity>(name: &str, kind: RelationKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            source: TableRef::of::<S>(),
            target: TableRef::of::<T>(),
            foreign_keys: Vec::new(),
            morphs: IndexMap::new(),
            map: None,
        }
    }

    /// `S` has exactly one `T`.
    pub fn one_to_one<S: Entity, T: Entity>(name: &str) -> Self {
        Self::direct::<S, T>(name, RelationKind::OneToOne)
    }

    /// `S` belongs to one `T`.
    pub fn many_to_one<S: Entity, T: Entity>(name: &str) -> Self {
        Self::direct::<S, T>(name, RelationKind::ManyToOne)
    }

    /// `S` has many `T`.
    pub fn one_to_many<S: Entity, T: Entity>(name: &str) -> Self {
        Self::direct::<S, T>(name, RelationKind::OneToMany)
    }

    /// `S` has many `T` through the map entity `M`.
    pub fn many_to_many<S: Entity, M: Entity, T: Entity>(name: &str) -> Self {
        Self {
            map: Some(MapTable {
                table: TableRef::of::<M>(),
                foreign_keys: Vec::new(),
                morphs: IndexMap::new(),
            }),
            ..Self::direct::<S, T>(name, RelationKind::ManyToMany)
        }
    }

    /// Add a key pair. For many-to-many relations the pair is
    /// (map column, target column).
    #[must_use]
    pub fn foreign_key(mut self, local: &str, foreign: &str) -> Self {
        self.foreign_keys
            .push((local.to_string(), foreign.to_string()));
        self
    }

    /// Add a (source column, map column) pair. Ignored on direct relations.
    #[must_use]
    pub fn map_foreign_key(mut self, source: &str, map: &str) -> Self {
        if let Some(table) = self.map.as_mut() {
            table
                .foreign_keys
                .push((source.to_string(), map.to_string()));
        }
        self
    }

    /// Require the target row to carry `value` in `column`.
    #[must_use]
    pub fn morph(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.morphs.insert(column.to_string(), value.into());
        self
    }

    /// Require the map row to carry `value` in `column`. Ignored on direct
    /// relations.
    #[must_use]
    pub fn map_morph(mut self, column: &str, value: impl Into<Value>) -> Self {
        if let Some(table) = self.map.as_mut() {
            table.morphs.insert(column.to_string(), value.into());
        }
        self
    }
}

/// The ordered, append-only list of an entity's relations.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    relations: Vec<Relation>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a relation. Registration order is preserved and matters:
    /// auto-join takes the first matching relation.
    pub fn register(&mut self, relation: Relation) -> &mut Self {
        self.relations.push(relation);
        self
    }

    /// All relations, in registration order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// The first relation registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
