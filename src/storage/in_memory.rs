//! In-memory implementation of RecordStore for testing and development

use crate::config::ModelsConfig;
use crate::core::events::{EventEnvelope, RecordEvent};
use crate::core::record::Record;
use crate::core::relation::Relation;
use crate::core::store::{PivotEntry, RecordStore};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Pivot row identity: (column, normalized key) pairs sorted by column
type PivotRowId = Vec<(String, String)>;

#[derive(Debug, Clone)]
struct PivotRow {
    /// Key columns, e.g. {"user_id": 1, "role_id": 3}
    keys: Map<String, Value>,
    attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    /// model -> normalized key -> attributes
    rows: HashMap<String, IndexMap<String, Map<String, Value>>>,
    /// Last generated key per model
    counters: HashMap<String, i64>,
    /// pivot table -> rows
    pivots: HashMap<String, IndexMap<PivotRowId, PivotRow>>,
    journal: Vec<EventEnvelope>,
}

impl Tables {
    fn record(&mut self, event: RecordEvent) {
        self.journal.push(EventEnvelope::new(event));
    }
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    snapshots: Vec<Tables>,
}

/// One side of a many-to-many relation, seen from a saved parent
struct PivotSide {
    table: String,
    foreign_pivot_key: String,
    related_pivot_key: String,
    parent_key: Value,
}

impl PivotSide {
    fn row_id(&self, related_key: &Value) -> PivotRowId {
        let mut id = vec![
            (self.foreign_pivot_key.clone(), normalize_key(&self.parent_key)),
            (self.related_pivot_key.clone(), normalize_key(related_key)),
        ];
        id.sort();
        id
    }

    fn new_row(&self, related_key: &Value, attributes: Map<String, Value>) -> PivotRow {
        let mut keys = Map::new();
        keys.insert(self.foreign_pivot_key.clone(), self.parent_key.clone());
        keys.insert(self.related_pivot_key.clone(), related_key.clone());
        PivotRow { keys, attributes }
    }

    fn owns(&self, row: &PivotRow) -> bool {
        row.keys
            .get(&self.foreign_pivot_key)
            .is_some_and(|key| normalize_key(key) == normalize_key(&self.parent_key))
    }

    fn related_key(&self, row: &PivotRow) -> Value {
        row.keys
            .get(&self.related_pivot_key)
            .cloned()
            .unwrap_or_default()
    }

    fn attached(&self, related_key: &Value, attributes: Map<String, Value>) -> RecordEvent {
        RecordEvent::PivotAttached {
            pivot: self.table.clone(),
            parent_key: self.parent_key.clone(),
            related_key: related_key.clone(),
            attributes,
        }
    }

    fn detached(&self, related_key: Value) -> RecordEvent {
        RecordEvent::PivotDetached {
            pivot: self.table.clone(),
            parent_key: self.parent_key.clone(),
            related_key,
        }
    }
}

/// In-memory record store
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
/// Keys are generated per model as increasing integers; `1` and `"1"`
/// address the same row. Transactions snapshot the whole store, so they are
/// only meaningful for one mutation at a time.
#[derive(Clone)]
pub struct InMemoryRecordStore {
    config: Arc<ModelsConfig>,
    state: Arc<RwLock<State>>,
}

impl InMemoryRecordStore {
    /// Create an empty store for the given models
    pub fn new(config: ModelsConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    pub fn config(&self) -> &ModelsConfig {
        &self.config
    }

    /// Every write performed so far, oldest first
    pub fn journal(&self) -> Result<Vec<EventEnvelope>> {
        Ok(self.read()?.tables.journal.clone())
    }

    /// All records of `model`, in insertion order
    pub fn records(&self, model: &str) -> Result<Vec<Record>> {
        let state = self.read()?;
        Ok(state
            .tables
            .rows
            .get(model)
            .map(|rows| {
                rows.values()
                    .map(|attributes| Record::existing(model, attributes.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn count(&self, model: &str) -> Result<usize> {
        let state = self.read()?;
        Ok(state.tables.rows.get(model).map_or(0, IndexMap::len))
    }

    /// Pivot links of `parent` through `field`, keyed by the related row
    pub fn pivot_links(&self, parent: &Record, field: &str) -> Result<Vec<PivotEntry>> {
        let side = self.pivot_side(parent, field)?;
        let state = self.read()?;

        Ok(state
            .tables
            .pivots
            .get(&side.table)
            .map(|rows| {
                rows.values()
                    .filter(|row| side.owns(row))
                    .map(|row| PivotEntry::with_attributes(side.related_key(row), row.attributes.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))
    }

    fn pivot_side(&self, parent: &Record, field: &str) -> Result<PivotSide> {
        let relation: Relation = self.require_relation(parent.model(), field)?;
        let missing = |what: &str| anyhow!("Relation '{}' on {} has no {}", field, parent.model(), what);

        Ok(PivotSide {
            table: relation.pivot.ok_or_else(|| missing("pivot"))?,
            foreign_pivot_key: relation
                .foreign_pivot_key
                .ok_or_else(|| missing("foreign pivot key"))?,
            related_pivot_key: relation
                .related_pivot_key
                .ok_or_else(|| missing("related pivot key"))?,
            parent_key: parent
                .key(&self.primary_key(parent.model()))
                .cloned()
                .ok_or_else(|| anyhow!("Parent {} must be saved first", parent.model()))?,
        })
    }
}

/// Canonical form of a key: `1` and `"1"` are the same row
fn normalize_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn same_value(left: &Value, right: &Value) -> bool {
    left == right
        || matches!(
            (left, right),
            (Value::String(_), Value::Number(_)) | (Value::Number(_), Value::String(_))
        ) && normalize_key(left) == normalize_key(right)
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    fn primary_key(&self, model: &str) -> String {
        self.config.primary_key(model).to_string()
    }

    fn relation(&self, model: &str, field: &str) -> Option<Relation> {
        self.config.find_relation(model, field).cloned()
    }

    async fn save(&self, record: &mut Record) -> Result<()> {
        let primary_key = self.primary_key(record.model());
        let model = record.model().to_string();
        let mut state = self.write()?;
        let tables = &mut state.tables;
        let counter = tables.counters.entry(model.clone()).or_insert(0);

        let key = match record.key(&primary_key).cloned() {
            Some(key) => {
                if let Some(explicit) = key.as_i64().or_else(|| key.as_str()?.parse().ok()) {
                    *counter = (*counter).max(explicit);
                }
                key
            }
            None => {
                *counter += 1;
                let key = json!(*counter);
                record.set(primary_key.clone(), key.clone());
                key
            }
        };

        let table = tables.rows.entry(model.clone()).or_default();
        let row = table.entry(normalize_key(&key)).or_default();
        let created = row.is_empty();
        for (name, value) in record.attributes() {
            row.insert(name.clone(), value.clone());
        }
        let attributes = row.clone();

        record.fill(attributes.clone());
        record.mark_persisted();
        tables.record(RecordEvent::Saved {
            model,
            key,
            created,
            attributes,
        });
        Ok(())
    }

    async fn delete(&self, model: &str, keys: &[Value]) -> Result<()> {
        let mut state = self.write()?;
        let tables = &mut state.tables;

        if let Some(table) = tables.rows.get_mut(model) {
            for key in keys {
                table.shift_remove(&normalize_key(key));
            }
        }
        tables.record(RecordEvent::Deleted {
            model: model.to_string(),
            keys: keys.to_vec(),
        });
        Ok(())
    }

    async fn find_by_key(&self, model: &str, key: &Value) -> Result<Option<Record>> {
        let state = self.read()?;
        Ok(state
            .tables
            .rows
            .get(model)
            .and_then(|rows| rows.get(&normalize_key(key)))
            .map(|attributes| Record::existing(model, attributes.clone())))
    }

    async fn query_by_keys(&self, model: &str, keys: &[Value]) -> Result<Vec<Record>> {
        let state = self.read()?;
        let Some(rows) = state.tables.rows.get(model) else {
            return Ok(Vec::new());
        };

        Ok(keys
            .iter()
            .filter_map(|key| rows.get(&normalize_key(key)))
            .map(|attributes| Record::existing(model, attributes.clone()))
            .collect())
    }

    async fn find_by_columns(
        &self,
        model: &str,
        columns: &Map<String, Value>,
    ) -> Result<Option<Record>> {
        let state = self.read()?;
        Ok(state.tables.rows.get(model).and_then(|rows| {
            rows.values()
                .find(|attributes| {
                    columns.iter().all(|(column, expected)| {
                        same_value(attributes.get(column).unwrap_or(&Value::Null), expected)
                    })
                })
                .map(|attributes| Record::existing(model, attributes.clone()))
        }))
    }

    async fn attach_pivot(
        &self,
        parent: &Record,
        field: &str,
        entries: &[PivotEntry],
    ) -> Result<()> {
        let side = self.pivot_side(parent, field)?;
        let mut state = self.write()?;
        let tables = &mut state.tables;

        for entry in entries {
            tables.pivots.entry(side.table.clone()).or_default().insert(
                side.row_id(&entry.key),
                side.new_row(&entry.key, entry.attributes.clone()),
            );
            tables.record(side.attached(&entry.key, entry.attributes.clone()));
        }
        Ok(())
    }

    async fn detach_pivot(&self, parent: &Record, field: &str, keys: &[Value]) -> Result<()> {
        let side = self.pivot_side(parent, field)?;
        let mut state = self.write()?;
        let tables = &mut state.tables;

        let mut detached = Vec::new();
        if let Some(rows) = tables.pivots.get_mut(&side.table) {
            for key in keys {
                if let Some(row) = rows.shift_remove(&side.row_id(key)) {
                    detached.push(side.related_key(&row));
                }
            }
        }

        for related_key in detached {
            tables.record(side.detached(related_key));
        }
        Ok(())
    }

    async fn sync_pivot(
        &self,
        parent: &Record,
        field: &str,
        entries: &[PivotEntry],
        detaching: bool,
    ) -> Result<()> {
        let side = self.pivot_side(parent, field)?;
        let mut state = self.write()?;
        let tables = &mut state.tables;
        let rows = tables.pivots.entry(side.table.clone()).or_default();
        let mut events = Vec::new();

        if detaching {
            let keep: Vec<PivotRowId> = entries.iter().map(|e| side.row_id(&e.key)).collect();
            let stale: Vec<PivotRowId> = rows
                .iter()
                .filter(|(id, row)| side.owns(row) && !keep.contains(id))
                .map(|(id, _)| id.clone())
                .collect();
            for id in stale {
                if let Some(row) = rows.shift_remove(&id) {
                    events.push(side.detached(side.related_key(&row)));
                }
            }
        }

        for entry in entries {
            let changed = match rows.get_mut(&side.row_id(&entry.key)) {
                Some(row) => {
                    let mut changed = false;
                    for (name, value) in &entry.attributes {
                        if row.attributes.get(name) != Some(value) {
                            row.attributes.insert(name.clone(), value.clone());
                            changed = true;
                        }
                    }
                    changed.then(|| row.attributes.clone())
                }
                None => {
                    rows.insert(
                        side.row_id(&entry.key),
                        side.new_row(&entry.key, entry.attributes.clone()),
                    );
                    Some(entry.attributes.clone())
                }
            };

            if let Some(attributes) = changed {
                events.push(side.attached(&entry.key, attributes));
            }
        }

        for event in events {
            tables.record(event);
        }
        Ok(())
    }

    async fn begin(&self) -> Result<()> {
        let mut state = self.write()?;
        let snapshot = state.tables.clone();
        state.snapshots.push(snapshot);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut state = self.write()?;
        state
            .snapshots
            .pop()
            .ok_or_else(|| anyhow!("No transaction to commit"))?;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut state = self.write()?;
        let snapshot = state
            .snapshots
            .pop()
            .ok_or_else(|| anyhow!("No transaction to roll back"))?;
        state.tables = snapshot;
        Ok(())
    }
}
