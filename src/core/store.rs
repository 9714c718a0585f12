//! The persistence boundary
//!
//! The engine never talks to a database directly. Everything it needs from
//! the data layer goes through [`RecordStore`]: relation metadata, building
//! related records, foreign key association, writes, key lookups and pivot
//! maintenance.
//!
//! Foreign key bookkeeping (`associate`, `dissociate`, `save_through_relation`,
//! ...) has default implementations driven by the [`Relation`] metadata, so a
//! backend only has to provide storage primitives.

use crate::core::record::Record;
use crate::core::relation::{Relation, RelationKind};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One link to attach through a pivot table, with extra pivot attributes
#[derive(Debug, Clone, PartialEq)]
pub struct PivotEntry {
    pub key: Value,
    pub attributes: Map<String, Value>,
}

impl PivotEntry {
    pub fn new(key: Value) -> Self {
        Self {
            key,
            attributes: Map::new(),
        }
    }

    pub fn with_attributes(key: Value, attributes: Map<String, Value>) -> Self {
        Self { key, attributes }
    }
}

/// Storage backend for records
///
/// Implementations must be safe to share across requests; a single mutation
/// calls into the store sequentially.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Primary key column of `model`
    fn primary_key(&self, _model: &str) -> String {
        "id".to_string()
    }

    /// Relation metadata for `field` on `model`, if it is a relation
    fn relation(&self, model: &str, field: &str) -> Option<Relation>;

    fn relation_kind(&self, model: &str, field: &str) -> RelationKind {
        self.relation(model, field)
            .map(|relation| relation.kind)
            .unwrap_or(RelationKind::None)
    }

    fn has_relation(&self, model: &str, field: &str) -> bool {
        self.relation_kind(model, field).is_relation()
    }

    /// Relation metadata, or an error naming the missing relation
    fn require_relation(&self, model: &str, field: &str) -> Result<Relation> {
        self.relation(model, field)
            .ok_or_else(|| anyhow!("No relation '{}' on model {}", field, model))
    }

    /// Build an unsaved instance of the model `field` points to
    fn new_related(&self, parent: &Record, field: &str) -> Result<Record> {
        let relation = self.require_relation(parent.model(), field)?;
        let related = relation.related.ok_or_else(|| {
            anyhow!(
                "Relation '{}' on {} has no fixed related model",
                field,
                parent.model()
            )
        })?;
        Ok(Record::new(related))
    }

    /// Point the owner's foreign key (and morph type) at `related`
    ///
    /// Only changes `parent` in memory; the caller saves it.
    fn associate(&self, parent: &mut Record, field: &str, related: &Record) -> Result<()> {
        let relation = self.require_relation(parent.model(), field)?;
        let foreign_key = owner_foreign_key(&relation, parent.model())?;
        let key = related
            .key(&self.primary_key(related.model()))
            .cloned()
            .ok_or_else(|| anyhow!("Cannot associate an unsaved {}", related.model()))?;

        parent.set(foreign_key, key);
        if let Some(morph_type) = &relation.morph_type {
            parent.set(morph_type.clone(), Value::String(related.model().to_string()));
        }
        Ok(())
    }

    /// Clear the owner's foreign key (and morph type)
    fn dissociate(&self, parent: &mut Record, field: &str) -> Result<()> {
        let relation = self.require_relation(parent.model(), field)?;
        let foreign_key = owner_foreign_key(&relation, parent.model())?;

        parent.set(foreign_key, Value::Null);
        if let Some(morph_type) = &relation.morph_type {
            parent.set(morph_type.clone(), Value::Null);
        }
        Ok(())
    }

    /// Point a child's foreign key (and morph type) at `parent`
    fn link_child(&self, parent: &Record, field: &str, child: &mut Record) -> Result<()> {
        let relation = self.require_relation(parent.model(), field)?;
        let foreign_key = child_foreign_key(&relation, parent.model())?;
        let key = parent
            .key(&self.primary_key(parent.model()))
            .cloned()
            .ok_or_else(|| anyhow!("Parent {} must be saved first", parent.model()))?;

        child.set(foreign_key, key);
        if let Some(morph_type) = &relation.morph_type {
            let class = relation
                .morph_class
                .clone()
                .unwrap_or_else(|| parent.model().to_string());
            child.set(morph_type.clone(), Value::String(class));
        }
        Ok(())
    }

    /// Clear a child's foreign key (and morph type), leaving the rest intact
    fn dissociate_child(&self, parent: &Record, field: &str, child: &mut Record) -> Result<()> {
        let relation = self.require_relation(parent.model(), field)?;
        let foreign_key = child_foreign_key(&relation, parent.model())?;

        child.set(foreign_key, Value::Null);
        if let Some(morph_type) = &relation.morph_type {
            child.set(morph_type.clone(), Value::Null);
        }
        Ok(())
    }

    /// Insert or update `record`, marking it persisted and filling its key
    async fn save(&self, record: &mut Record) -> Result<()>;

    /// Save `child` with its foreign key pointing at `parent`, in one write
    async fn save_through_relation(
        &self,
        parent: &Record,
        field: &str,
        child: &mut Record,
    ) -> Result<()> {
        self.link_child(parent, field, child)?;
        self.save(child).await
    }

    /// Delete the records of `model` with the given keys
    async fn delete(&self, model: &str, keys: &[Value]) -> Result<()>;

    async fn find_by_key(&self, model: &str, key: &Value) -> Result<Option<Record>>;

    /// Records of `model` with the given keys, in key order; missing keys are skipped
    async fn query_by_keys(&self, model: &str, keys: &[Value]) -> Result<Vec<Record>>;

    /// First record of `model` whose columns equal all of `columns`
    async fn find_by_columns(
        &self,
        model: &str,
        columns: &Map<String, Value>,
    ) -> Result<Option<Record>>;

    /// Link `parent` to each entry through the pivot of `field`
    async fn attach_pivot(&self, parent: &Record, field: &str, entries: &[PivotEntry])
    -> Result<()>;

    /// Remove the pivot links from `parent` to `keys`
    async fn detach_pivot(&self, parent: &Record, field: &str, keys: &[Value]) -> Result<()>;

    /// Make the pivot links match `entries`; links not listed are removed
    /// only when `detaching`
    async fn sync_pivot(
        &self,
        parent: &Record,
        field: &str,
        entries: &[PivotEntry],
        detaching: bool,
    ) -> Result<()>;

    async fn begin(&self) -> Result<()> {
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        Ok(())
    }
}

fn owner_foreign_key<'a>(relation: &'a Relation, model: &str) -> Result<&'a str> {
    if !relation.kind.resolves_before_save() {
        return Err(anyhow!(
            "Relation '{}' on {} is {}, the owner holds no foreign key",
            relation.field,
            model,
            relation.kind
        ));
    }
    relation
        .foreign_key
        .as_deref()
        .ok_or_else(|| anyhow!("Relation '{}' on {} has no foreign key", relation.field, model))
}

fn child_foreign_key<'a>(relation: &'a Relation, model: &str) -> Result<&'a str> {
    if !matches!(
        relation.kind,
        RelationKind::OwnedToOne | RelationKind::OwnedToMany
    ) {
        return Err(anyhow!(
            "Relation '{}' on {} is {}, the related row holds no foreign key",
            relation.field,
            model,
            relation.kind
        ));
    }
    relation
        .foreign_key
        .as_deref()
        .ok_or_else(|| anyhow!("Relation '{}' on {} has no foreign key", relation.field, model))
}
