//! The resolution chain: before-relations, attributes, save, after-relations

use super::MutationEngine;
use super::partition::{Owner, Partitioned, partition};
use crate::core::argument::{Argument, ArgumentSet};
use crate::core::error::{EngineError, EngineResult};
use crate::core::record::Record;
use crate::core::store::PivotEntry;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};

/// How a record being resolved hangs off its parent
#[derive(Debug, Clone, Copy)]
pub enum ParentRelation<'a> {
    /// A root record, or one saved standalone before being associated
    None,
    /// A child whose foreign key points at `parent`
    Owned { parent: &'a Record, field: &'a str },
    /// A child linked to `parent` through a pivot
    Pivot { parent: &'a Record, field: &'a str },
}

impl MutationEngine {
    /// Resolve `args` onto `record` and persist it
    pub fn resolve<'a>(
        &'a self,
        record: Record,
        args: ArgumentSet,
        parent: ParentRelation<'a>,
    ) -> BoxFuture<'a, EngineResult<Record>> {
        async move { self.resolve_impl(record, args, parent).await }.boxed()
    }

    async fn resolve_impl(
        &self,
        mut record: Record,
        args: ArgumentSet,
        parent: ParentRelation<'_>,
    ) -> EngineResult<Record> {
        let model = record.model().to_string();
        let Partitioned {
            before,
            regular,
            after,
            plan,
        } = partition(args, Some(Owner::new(self.store(), &model)));

        for (field, argument) in before {
            self.resolve_before_save(&mut record, &field, plan.kind(&field), argument.value)
                .await?;
        }

        record.fill(
            regular
                .iter()
                .map(|(name, argument)| (name.clone(), argument.to_plain()))
                .collect(),
        );

        self.persist(&mut record, parent).await?;

        for (field, argument) in after {
            self.resolve_after_save(&record, &field, plan.kind(&field), argument.value)
                .await?;
        }

        Ok(record)
    }

    async fn persist(&self, record: &mut Record, parent: ParentRelation<'_>) -> EngineResult<()> {
        match parent {
            ParentRelation::None => {
                tracing::debug!(model = %record.model(), exists = record.exists(), "Saving record");
                self.store().save(record).await?;
            }
            ParentRelation::Owned { parent, field } => {
                tracing::debug!(
                    model = %record.model(),
                    parent = %parent.model(),
                    field,
                    "Saving record through relation"
                );
                self.store().save_through_relation(parent, field, record).await?;
            }
            ParentRelation::Pivot { parent, field } => {
                tracing::debug!(
                    model = %record.model(),
                    parent = %parent.model(),
                    field,
                    "Saving record and attaching through pivot"
                );
                self.store().save(record).await?;
                let key = record
                    .key(&self.store().primary_key(record.model()))
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("Saved {} has no key", record.model()))?;
                self.store()
                    .sync_pivot(parent, field, &[PivotEntry::new(key)], false)
                    .await?;
            }
        }
        Ok(())
    }

    /// Name of the identifying field supplied in `args`: `id`, else the primary key
    fn key_field(&self, model: &str, args: &ArgumentSet) -> Option<String> {
        let primary_key = self.store().primary_key(model);
        ["id", primary_key.as_str()]
            .into_iter()
            .find(|name| args.has(name))
            .map(str::to_string)
    }

    /// Take the identifier out of `args`
    ///
    /// Fails with [`EngineError::MissingPrimaryKey`] when neither `id` nor the
    /// model's primary key was supplied.
    pub fn locate(&self, model: &str, args: &mut ArgumentSet) -> EngineResult<Value> {
        self.key_field(model, args)
            .and_then(|field| args.remove(&field))
            .map(|argument| argument.to_plain())
            .ok_or_else(|| EngineError::MissingPrimaryKey {
                model: model.to_string(),
            })
    }

    /// Locate and load the record an update targets
    pub async fn load_for_update(&self, model: &str, args: &mut ArgumentSet) -> EngineResult<Record> {
        let id = self.locate(model, args)?;
        self.store()
            .find_by_key(model, &id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                model: model.to_string(),
                id,
            })
    }

    /// Find the record an upsert should update, if any
    ///
    /// Identifying columns are tried first, then a supplied key. A matched
    /// record has the key stripped from `args`; otherwise `args` is left as
    /// is and the caller creates.
    pub async fn match_upsert(
        &self,
        model: &str,
        args: &mut ArgumentSet,
        identifying_columns: &[String],
    ) -> EngineResult<Option<Record>> {
        if !identifying_columns.is_empty() {
            match identifying_values(args, identifying_columns) {
                Some(columns) => {
                    if let Some(existing) = self.store().find_by_columns(model, &columns).await? {
                        tracing::debug!(model, "Upsert matched by identifying columns");
                        if let Some(field) = self.key_field(model, args) {
                            args.remove(&field);
                        }
                        return Ok(Some(existing));
                    }
                }
                None => {
                    tracing::debug!(model, "Identifying columns not all supplied, matching by key");
                }
            }
        }

        let Some(field) = self.key_field(model, args) else {
            return Ok(None);
        };
        let key = args.get(&field).map(Argument::to_plain).unwrap_or_default();

        match self.store().find_by_key(model, &key).await? {
            Some(existing) => {
                tracing::debug!(model, key = %key, "Upsert matched by key");
                args.remove(&field);
                Ok(Some(existing))
            }
            None => Ok(None),
        }
    }
}

fn identifying_values(args: &ArgumentSet, columns: &[String]) -> Option<Map<String, Value>> {
    columns
        .iter()
        .map(|column| {
            args.get(column)
                .map(|argument| (column.clone(), argument.to_plain()))
        })
        .collect()
}

#[cfg(all(test, feature = "in-memory"))]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, ModelsConfig};
    use crate::core::argument::ArgumentValue;
    use crate::core::types::TypeDescriptor;
    use crate::storage::InMemoryRecordStore;
    use serde_json::json;
    use std::sync::Arc;

    fn engine() -> (Arc<InMemoryRecordStore>, MutationEngine) {
        let mut company = ModelConfig::new("Company");
        company.primary_key = "uuid".to_string();
        let store = Arc::new(InMemoryRecordStore::new(ModelsConfig {
            models: vec![ModelConfig::new("User"), company],
        }));
        (store.clone(), MutationEngine::new(store))
    }

    fn args(value: Value) -> ArgumentSet {
        let mut set = ArgumentSet::new();
        if let Value::Object(map) = value {
            for (name, value) in map {
                let value = if value.is_null() {
                    ArgumentValue::Null
                } else {
                    ArgumentValue::Scalar(value)
                };
                set.insert(name, Argument::new(value, TypeDescriptor::named("Any")));
            }
        }
        set
    }

    #[test]
    fn test_locate_prefers_id_and_removes_it() {
        let (_, engine) = engine();
        let mut set = args(json!({"uuid": "a", "id": 1, "name": "x"}));
        let id = engine.locate("Company", &mut set).expect("located");
        assert_eq!(id, json!(1));
        assert!(!set.is_supplied("id"));
        assert!(set.is_supplied("uuid"));
    }

    #[test]
    fn test_locate_falls_back_to_primary_key() {
        let (_, engine) = engine();
        let mut set = args(json!({"uuid": "a", "name": "x"}));
        assert_eq!(engine.locate("Company", &mut set).expect("located"), json!("a"));
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_locate_without_key_fails() {
        let (_, engine) = engine();
        let mut set = args(json!({"name": "x", "id": null}));
        let err = engine.locate("User", &mut set).expect_err("no key");
        assert!(matches!(err, EngineError::MissingPrimaryKey { ref model } if model == "User"));
    }

    #[tokio::test]
    async fn test_load_for_update_not_found() {
        let (_, engine) = engine();
        let mut set = args(json!({"id": 5, "name": "x"}));
        let err = engine
            .load_for_update("User", &mut set)
            .await
            .expect_err("nothing stored");
        assert!(matches!(err, EngineError::NotFound { ref id, .. } if id == &json!(5)));
    }

    #[tokio::test]
    async fn test_match_upsert_by_columns_then_key() {
        let (store, engine) = engine();
        let mut user = Record::new("User");
        user.set("email", json!("a@b.c"));
        crate::core::store::RecordStore::save(store.as_ref(), &mut user)
            .await
            .expect("seed");

        let columns = vec!["email".to_string()];
        let mut set = args(json!({"email": "a@b.c", "name": "n"}));
        let matched = engine
            .match_upsert("User", &mut set, &columns)
            .await
            .expect("match");
        assert_eq!(matched.expect("should match").get("id"), Some(&json!(1)));

        let mut set = args(json!({"id": 1, "name": "n"}));
        let matched = engine
            .match_upsert("User", &mut set, &[])
            .await
            .expect("match");
        assert!(matched.is_some());
        assert!(!set.is_supplied("id"), "matched key is stripped");

        let mut set = args(json!({"id": 99, "name": "n"}));
        let matched = engine
            .match_upsert("User", &mut set, &[])
            .await
            .expect("match");
        assert!(matched.is_none());
        assert!(set.is_supplied("id"), "unmatched key is kept for the create");
    }

    #[tokio::test]
    async fn test_match_upsert_without_key_or_columns_creates() {
        let (_, engine) = engine();
        let mut set = args(json!({"name": "n"}));
        let matched = engine
            .match_upsert("User", &mut set, &[])
            .await
            .expect("never fails");
        assert!(matched.is_none());
    }
}
