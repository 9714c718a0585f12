//! Nested mutation resolution
//!
//! [`MutationEngine`] walks an [`ArgumentSet`] for one record:
//!
//! 1. [`partition`] splits the fields into before/regular/after buckets
//! 2. before-relations set foreign keys on the record in memory
//! 3. regular fields are filled onto the record
//! 4. the record is saved, standalone or through its parent relation
//! 5. after-relations run against the saved record
//!
//! Nested `create`/`update`/`upsert` operations recurse into the same chain
//! with the current record as parent. Store calls are awaited one at a time,
//! in that order, so every write of a mutation happens in a fixed sequence.

pub mod chain;
pub mod nested;
pub mod operation;
pub mod partition;

pub use chain::ParentRelation;
pub use operation::{NestedOperation, OperationKind, plan_operations};
pub use partition::{Owner, Partitioned, ResolutionPlan, partition};

use crate::core::argument::ArgumentSet;
use crate::core::error::{EngineError, EngineResult};
use crate::core::record::Record;
use crate::core::store::RecordStore;
use std::sync::Arc;

/// Resolves nested mutations against a [`RecordStore`]
///
/// The engine holds no per-request state; the caller owns the transaction
/// around each call.
#[derive(Clone)]
pub struct MutationEngine {
    store: Arc<dyn RecordStore>,
}

impl MutationEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Resolve `args` onto a root record and return it persisted
    pub async fn resolve_mutation(&self, record: Record, args: ArgumentSet) -> EngineResult<Record> {
        tracing::debug!(model = %record.model(), exists = record.exists(), "Resolving mutation");
        self.resolve(record, args, ParentRelation::None).await
    }

    /// Create a new `model` record from `args`
    pub async fn create(&self, model: &str, args: ArgumentSet) -> EngineResult<Record> {
        self.resolve_mutation(Record::new(model), args).await
    }

    /// Update the `model` record identified in `args`
    pub async fn update(&self, model: &str, mut args: ArgumentSet) -> EngineResult<Record> {
        let existing = self.load_for_update(model, &mut args).await?;
        self.resolve_mutation(existing, args).await
    }

    /// Update the matching `model` record, or create one
    ///
    /// Identifying columns come from an `@upsert` directive carried by `args`.
    pub async fn upsert(&self, model: &str, mut args: ArgumentSet) -> EngineResult<Record> {
        let columns = args.identifying_columns();
        let target = self
            .match_upsert(model, &mut args, &columns)
            .await?
            .unwrap_or_else(|| Record::new(model));
        self.resolve_mutation(target, args).await
    }

    /// Delete the `model` record identified in `args`, returning it as it was
    pub async fn delete(&self, model: &str, mut args: ArgumentSet) -> EngineResult<Record> {
        let id = self.locate(model, &mut args)?;
        let record = self
            .store
            .find_by_key(model, &id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                model: model.to_string(),
                id: id.clone(),
            })?;

        tracing::debug!(model, id = %id, "Deleting record");
        self.store.delete(model, &[id]).await?;
        Ok(record)
    }
}
