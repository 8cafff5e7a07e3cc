//! Per-row processing: stages, then hydration.
//!
//! Every fetched row runs through a [`RowPipeline`]: an ordered list of
//! [`RowStage`]s (grouping first, when enabled) followed by a final typed
//! step, either a [`Hydrator`] for entities or [`FromGroupedRow`] for plain
//! targets. Pipelines are built per fetch from the query's own settings.

use crate::grouping::group_item;
use joinery_core::{Entity, EntityMetadata, GroupedRow, Orm, Result};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// One transformation applied to each fetched row.
///
/// A stage may drop a row by returning `None`; later stages then see
/// `None` too.
pub trait RowStage: Send + Sync {
    #[allow(clippy::result_large_err)]
    fn process(&self, row: Option<GroupedRow>) -> Result<Option<GroupedRow>>;
}

impl<F> RowStage for F
where
    F: Fn(Option<GroupedRow>) -> Result<Option<GroupedRow>> + Send + Sync,
{
    fn process(&self, row: Option<GroupedRow>) -> Result<Option<GroupedRow>> {
        self(row)
    }
}

/// Splits `prefix<divider>column` keys into nested rows.
#[derive(Debug, Clone)]
pub struct GroupingStage {
    divider: String,
}

impl GroupingStage {
    pub fn new(divider: impl Into<String>) -> Self {
        Self {
            divider: divider.into(),
        }
    }

    pub fn divider(&self) -> &str {
        &self.divider
    }
}

impl RowStage for GroupingStage {
    fn process(&self, row: Option<GroupedRow>) -> Result<Option<GroupedRow>> {
        Ok(group_item(row, &self.divider))
    }
}

/// An ordered list of stages.
#[derive(Clone, Default)]
pub struct RowPipeline {
    stages: Vec<Arc<dyn RowStage>>,
}

impl RowPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn RowStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run `row` through every stage in order.
    #[allow(clippy::result_large_err)]
    pub fn run(&self, row: Option<GroupedRow>) -> Result<Option<GroupedRow>> {
        self.stages
            .iter()
            .try_fold(row, |row, stage| stage.process(row))
    }
}

impl fmt::Debug for RowPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowPipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

/// Targets built from a processed row without entity hydration.
pub trait FromGroupedRow: Sized {
    #[allow(clippy::result_large_err)]
    fn from_grouped_row(orm: &Orm, row: GroupedRow) -> Result<Self>;
}

impl FromGroupedRow for GroupedRow {
    fn from_grouped_row(_orm: &Orm, row: GroupedRow) -> Result<Self> {
        Ok(row)
    }
}

/// Final step turning processed rows into entities of type `E`.
///
/// Metadata of `E` is resolved once, when the hydrator is created.
pub struct Hydrator<E> {
    orm: Arc<Orm>,
    metadata: Arc<EntityMetadata>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Hydrator<E> {
    pub fn new(orm: Arc<Orm>) -> Self {
        let metadata = orm.metadata::<E>();
        Self {
            orm,
            metadata,
            _marker: PhantomData,
        }
    }

    /// Build a fresh `E` from `row`. `None` stays `None`.
    #[allow(clippy::result_large_err)]
    pub fn hydrate(&self, row: Option<GroupedRow>) -> Result<Option<E>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut entity = E::create();
        self.orm.hydrate_with(&self.metadata, &mut entity, &row)?;
        Ok(Some(entity))
    }

    /// Fill `target` from `row`. `None` leaves the result empty and drops
    /// `target`.
    #[allow(clippy::result_large_err)]
    pub fn hydrate_into(&self, row: Option<GroupedRow>, mut target: E) -> Result<Option<E>> {
        let Some(row) = row else {
            return Ok(None);
        };
        self.orm.hydrate_with(&self.metadata, &mut target, &row)?;
        Ok(Some(target))
    }
}

impl<E> Clone for Hydrator<E> {
    fn clone(&self) -> Self {
        Self {
            orm: Arc::clone(&self.orm),
            metadata: Arc::clone(&self.metadata),
            _marker: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Hydrator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hydrator")
            .field("entity", &std::any::type_name::<E>())
            .finish()
    }
}
