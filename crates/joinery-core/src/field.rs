//! Field and column definitions.

use crate::cast::{FieldCaster, SaveCast, ValueCast};

/// Metadata about an entity field/column.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    /// Rust field name
    pub name: &'static str,
    /// Database column name (may differ from field name)
    pub column: &'static str,
    /// Whether this is a primary key
    pub primary_key: bool,
    /// Casters applied to this field, in declaration order
    pub casters: &'static [FieldCaster],
}

impl FieldInfo {
    /// A field whose column has the same name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column: name,
            primary_key: false,
            casters: &[],
        }
    }

    /// Set the database column name.
    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = column;
        self
    }

    /// Mark as (part of) the primary key.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    /// Attach casters.
    pub const fn casters(mut self, casters: &'static [FieldCaster]) -> Self {
        self.casters = casters;
        self
    }

    /// Casters that run when reading and writing values.
    pub fn value_casters(&self) -> impl Iterator<Item = &'static ValueCast> {
        self.casters.iter().filter_map(|c| match c {
            FieldCaster::Value(cast) => Some(cast),
            FieldCaster::Save(_) => None,
        })
    }

    /// Casters that run right before the entity is stored.
    pub fn save_casters(&self) -> impl Iterator<Item = &'static SaveCast> {
        self.casters.iter().filter_map(|c| match c {
            FieldCaster::Save(cast) => Some(cast),
            FieldCaster::Value(_) => None,
        })
    }
}
