//! Interpreters for the operations nested under relation fields
//!
//! One interpreter per relation kind. Each takes the operations of a single
//! relation field, already put in order by [`plan_operations`], and applies
//! them against the record that owns the field.

use super::MutationEngine;
use super::chain::ParentRelation;
use super::operation::{NestedOperation, OperationKind, plan_operations};
use crate::core::argument::{ArgumentSet, ArgumentValue};
use crate::core::error::{EngineError, EngineResult};
use crate::core::record::Record;
use crate::core::relation::RelationKind;
use crate::core::store::PivotEntry;
use serde_json::Value;

impl MutationEngine {
    /// Resolve a relation whose foreign key lives on `record`
    ///
    /// Only changes `record` in memory; related records may be written.
    pub(crate) async fn resolve_before_save(
        &self,
        record: &mut Record,
        field: &str,
        kind: RelationKind,
        value: ArgumentValue,
    ) -> EngineResult<()> {
        let Some(args) = operations_input(field, value)? else {
            return Ok(());
        };

        match kind {
            RelationKind::OwningToOnePolymorphic => self.resolve_morph_to(record, field, args).await,
            RelationKind::OwningToOne => self.resolve_owning_to_one(record, field, args).await,
            other => Err(EngineError::unsupported(
                relation_name(other, field),
                "resolve before save",
            )),
        }
    }

    /// Resolve a relation that needs the persisted `record`'s key
    pub(crate) async fn resolve_after_save(
        &self,
        record: &Record,
        field: &str,
        kind: RelationKind,
        value: ArgumentValue,
    ) -> EngineResult<()> {
        let Some(args) = operations_input(field, value)? else {
            return Ok(());
        };

        match kind {
            RelationKind::OwnedToOne | RelationKind::OwnedToMany => {
                self.resolve_owned(record, field, kind, args).await
            }
            RelationKind::ManyToMany => self.resolve_many_to_many(record, field, args).await,
            other => Err(EngineError::unsupported(
                relation_name(other, field),
                "resolve after save",
            )),
        }
    }

    async fn resolve_owning_to_one(
        &self,
        record: &mut Record,
        field: &str,
        args: ArgumentSet,
    ) -> EngineResult<()> {
        let related_model = self.store().new_related(record, field)?.model().to_string();

        for operation in plan_operations(RelationKind::OwningToOne, args) {
            trace_operation(record, field, &operation);

            match operation.kind {
                OperationKind::Create => {
                    let input = expect_set(field, operation)?;
                    let related = self.store().new_related(record, field)?;
                    let related = self.resolve(related, input, ParentRelation::None).await?;
                    self.store().associate(record, field, &related)?;
                }
                OperationKind::Connect => {
                    let key = expect_scalar(field, operation)?;
                    let related = Record::placeholder(
                        &related_model,
                        &self.store().primary_key(&related_model),
                        key,
                    );
                    self.store().associate(record, field, &related)?;
                }
                OperationKind::Update => {
                    let mut input = expect_set(field, operation)?;
                    let existing = self.load_for_update(&related_model, &mut input).await?;
                    let related = self.resolve(existing, input, ParentRelation::None).await?;
                    self.store().associate(record, field, &related)?;
                }
                OperationKind::Upsert => {
                    let mut input = expect_set(field, operation)?;
                    let columns = input.identifying_columns();
                    let target = self
                        .match_upsert(&related_model, &mut input, &columns)
                        .await?
                        .unwrap_or_else(|| Record::new(&related_model));
                    let related = self.resolve(target, input, ParentRelation::None).await?;
                    self.store().associate(record, field, &related)?;
                }
                OperationKind::Disconnect => self.disconnect_owner(record, field, &operation.value)?,
                OperationKind::Delete => {
                    self.delete_owned_by(record, field, &operation.value, Some(&related_model))
                        .await?
                }
                OperationKind::Sync | OperationKind::SyncWithoutDetaching => {}
            }
        }

        Ok(())
    }

    async fn resolve_morph_to(
        &self,
        record: &mut Record,
        field: &str,
        args: ArgumentSet,
    ) -> EngineResult<()> {
        for operation in plan_operations(RelationKind::OwningToOnePolymorphic, args) {
            trace_operation(record, field, &operation);

            match operation.kind {
                OperationKind::Create | OperationKind::Update | OperationKind::Upsert => {
                    return Err(EngineError::unsupported(
                        relation_name(RelationKind::OwningToOnePolymorphic, field),
                        operation.kind.as_str(),
                    ));
                }
                OperationKind::Connect => {
                    let input = expect_set(field, operation)?;
                    let morph_type = morph_type_name(field, input.get("type").map(|a| &a.value))?;
                    let key = input
                        .get("id")
                        .and_then(|argument| argument.value.as_scalar())
                        .cloned()
                        .ok_or_else(|| {
                            EngineError::invalid_input(format!(
                                "'connect' on '{}' requires an id",
                                field
                            ))
                        })?;
                    let related = Record::placeholder(
                        &morph_type,
                        &self.store().primary_key(&morph_type),
                        key,
                    );
                    self.store().associate(record, field, &related)?;
                }
                OperationKind::Disconnect => self.disconnect_owner(record, field, &operation.value)?,
                OperationKind::Delete => {
                    self.delete_owned_by(record, field, &operation.value, None)
                        .await?
                }
                OperationKind::Sync | OperationKind::SyncWithoutDetaching => {}
            }
        }

        Ok(())
    }

    async fn resolve_owned(
        &self,
        record: &Record,
        field: &str,
        kind: RelationKind,
        args: ArgumentSet,
    ) -> EngineResult<()> {
        let related_model = self.store().new_related(record, field)?.model().to_string();

        for operation in plan_operations(kind, args) {
            trace_operation(record, field, &operation);

            match operation.kind {
                OperationKind::Create | OperationKind::Update | OperationKind::Upsert => {
                    let parent = ParentRelation::Owned {
                        parent: record,
                        field,
                    };
                    self.save_children(&related_model, operation, parent).await?;
                }
                OperationKind::Connect => {
                    let keys = expect_keys(field, operation)?;
                    for mut child in self.store().query_by_keys(&related_model, &keys).await? {
                        self.store()
                            .save_through_relation(record, field, &mut child)
                            .await?;
                    }
                }
                OperationKind::Disconnect => {
                    let keys = expect_keys(field, operation)?;
                    for mut child in self.store().query_by_keys(&related_model, &keys).await? {
                        self.store().dissociate_child(record, field, &mut child)?;
                        self.store().save(&mut child).await?;
                    }
                }
                OperationKind::Delete => {
                    let keys = expect_keys(field, operation)?;
                    self.store().delete(&related_model, &keys).await?;
                }
                OperationKind::Sync | OperationKind::SyncWithoutDetaching => {}
            }
        }

        Ok(())
    }

    async fn resolve_many_to_many(
        &self,
        record: &Record,
        field: &str,
        args: ArgumentSet,
    ) -> EngineResult<()> {
        let related_model = self.store().new_related(record, field)?.model().to_string();

        for operation in plan_operations(RelationKind::ManyToMany, args) {
            trace_operation(record, field, &operation);

            match operation.kind {
                OperationKind::Sync => {
                    let entries = pivot_entries(field, operation)?;
                    self.store().sync_pivot(record, field, &entries, true).await?;
                }
                OperationKind::SyncWithoutDetaching => {
                    let entries = pivot_entries(field, operation)?;
                    self.store().sync_pivot(record, field, &entries, false).await?;
                }
                OperationKind::Create | OperationKind::Update | OperationKind::Upsert => {
                    let parent = ParentRelation::Pivot {
                        parent: record,
                        field,
                    };
                    self.save_children(&related_model, operation, parent).await?;
                }
                OperationKind::Delete => {
                    let keys = expect_keys(field, operation)?;
                    self.store().detach_pivot(record, field, &keys).await?;
                    self.store().delete(&related_model, &keys).await?;
                }
                OperationKind::Connect => {
                    let entries = pivot_entries(field, operation)?;
                    self.store().attach_pivot(record, field, &entries).await?;
                }
                OperationKind::Disconnect => {
                    let keys = expect_keys(field, operation)?;
                    self.store().detach_pivot(record, field, &keys).await?;
                }
            }
        }

        Ok(())
    }

    /// Create, update or upsert each input of `operation` as a child of `parent`
    async fn save_children(
        &self,
        related_model: &str,
        operation: NestedOperation,
        parent: ParentRelation<'_>,
    ) -> EngineResult<()> {
        let kind = operation.kind;
        let field = match parent {
            ParentRelation::Owned { field, .. } | ParentRelation::Pivot { field, .. } => field,
            ParentRelation::None => related_model,
        };

        for mut input in expect_sets(field, operation)? {
            let target = match kind {
                OperationKind::Update => self.load_for_update(related_model, &mut input).await?,
                OperationKind::Upsert => {
                    let columns = input.identifying_columns();
                    self.match_upsert(related_model, &mut input, &columns)
                        .await?
                        .unwrap_or_else(|| Record::new(related_model))
                }
                _ => Record::new(related_model),
            };
            self.resolve(target, input, parent).await?;
        }

        Ok(())
    }

    /// Clear the foreign key on `record`; falsy values are a no-op
    fn disconnect_owner(&self, record: &mut Record, field: &str, signal: &ArgumentValue) -> EngineResult<()> {
        if !signal.is_truthy() {
            tracing::debug!(field, "Ignoring falsy disconnect");
            return Ok(());
        }
        self.store().dissociate(record, field)?;
        Ok(())
    }

    /// Clear the foreign key on `record` and delete the record it pointed at
    ///
    /// Without `related_model` the model is read from the morph type column.
    /// Falsy values are a no-op.
    async fn delete_owned_by(
        &self,
        record: &mut Record,
        field: &str,
        signal: &ArgumentValue,
        related_model: Option<&str>,
    ) -> EngineResult<()> {
        if !signal.is_truthy() {
            tracing::debug!(field, "Ignoring falsy delete");
            return Ok(());
        }

        let relation = self.store().require_relation(record.model(), field)?;
        let current = relation
            .foreign_key
            .as_deref()
            .and_then(|foreign_key| record.key(foreign_key))
            .cloned();
        let model = related_model.map(str::to_string).or_else(|| {
            relation
                .morph_type
                .as_deref()
                .and_then(|morph_type| record.get(morph_type))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        self.store().dissociate(record, field)?;
        if let (Some(model), Some(key)) = (model, current) {
            self.store().delete(&model, &[key]).await?;
        }
        Ok(())
    }
}

fn trace_operation(record: &Record, field: &str, operation: &NestedOperation) {
    tracing::debug!(
        model = %record.model(),
        field,
        operation = %operation.kind,
        "Applying nested operation"
    );
}

fn relation_name(kind: RelationKind, field: &str) -> String {
    format!("{} relation '{}'", kind, field)
}

/// The operations set of a relation field; `None` when it is null
fn operations_input(field: &str, value: ArgumentValue) -> EngineResult<Option<ArgumentSet>> {
    match value {
        ArgumentValue::Set(set) => Ok(Some(set)),
        ArgumentValue::Null | ArgumentValue::Undefined => Ok(None),
        other => Err(EngineError::invalid_input(format!(
            "relation field '{}' expects an input object, got {}",
            field,
            other.to_plain()
        ))),
    }
}

fn expect_set(field: &str, operation: NestedOperation) -> EngineResult<ArgumentSet> {
    match operation.value {
        ArgumentValue::Set(set) => Ok(set),
        other => Err(EngineError::invalid_input(format!(
            "'{}' on '{}' expects an input object, got {}",
            operation.kind,
            field,
            other.to_plain()
        ))),
    }
}

fn expect_sets(field: &str, operation: NestedOperation) -> EngineResult<Vec<ArgumentSet>> {
    let kind = operation.kind;
    operation
        .value
        .into_vec()
        .into_iter()
        .map(|item| expect_set(field, NestedOperation { kind, value: item }))
        .collect()
}

fn expect_scalar(field: &str, operation: NestedOperation) -> EngineResult<Value> {
    match operation.value {
        ArgumentValue::Scalar(value) => Ok(value),
        other => Err(EngineError::invalid_input(format!(
            "'{}' on '{}' expects an identifier, got {}",
            operation.kind,
            field,
            other.to_plain()
        ))),
    }
}

fn expect_keys(field: &str, operation: NestedOperation) -> EngineResult<Vec<Value>> {
    let kind = operation.kind;
    operation
        .value
        .into_vec()
        .into_iter()
        .map(|item| expect_scalar(field, NestedOperation { kind, value: item }))
        .collect()
}

/// Pivot links from either a list of keys or a list of `{id, ...attributes}`
///
/// The first element decides which of the two shapes the whole list has.
fn pivot_entries(field: &str, operation: NestedOperation) -> EngineResult<Vec<PivotEntry>> {
    let kind = operation.kind;
    let items = operation.value.into_vec();
    let with_attributes = matches!(items.first(), Some(ArgumentValue::Set(_)));

    items
        .into_iter()
        .map(|item| {
            if !with_attributes {
                return expect_scalar(field, NestedOperation { kind, value: item })
                    .map(PivotEntry::new);
            }

            let mut attributes = expect_set(field, NestedOperation { kind, value: item })?.to_map();
            let key = attributes
                .remove("id")
                .filter(|key| !key.is_null())
                .ok_or_else(|| {
                    EngineError::invalid_input(format!(
                        "'{}' on '{}' expects an id in every entry",
                        kind, field
                    ))
                })?;
            Ok(PivotEntry::with_attributes(key, attributes))
        })
        .collect()
}

/// The model named by a morph `type` argument, given as a string or an enum value
fn morph_type_name(field: &str, value: Option<&ArgumentValue>) -> EngineResult<String> {
    match value {
        Some(ArgumentValue::Scalar(Value::String(name))) if !name.is_empty() => Ok(name.clone()),
        _ => Err(EngineError::invalid_input(format!(
            "'connect' on '{}' requires a type name",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::argument::Argument;
    use crate::core::types::TypeDescriptor;
    use serde_json::json;

    fn operation(value: ArgumentValue) -> NestedOperation {
        NestedOperation {
            kind: OperationKind::Sync,
            value,
        }
    }

    fn pivot_object(id: Value, meta: &str) -> ArgumentValue {
        let mut set = ArgumentSet::new();
        set.insert(
            "id",
            Argument::new(ArgumentValue::Scalar(id), TypeDescriptor::named("ID")),
        );
        set.insert(
            "meta",
            Argument::new(ArgumentValue::Scalar(json!(meta)), TypeDescriptor::named("String")),
        );
        ArgumentValue::Set(set)
    }

    #[test]
    fn test_pivot_entries_from_keys() {
        let entries = pivot_entries(
            "users",
            operation(ArgumentValue::List(vec![
                ArgumentValue::Scalar(json!(1)),
                ArgumentValue::Scalar(json!("2")),
            ])),
        )
        .expect("entries");
        assert_eq!(entries, vec![PivotEntry::new(json!(1)), PivotEntry::new(json!("2"))]);
    }

    #[test]
    fn test_pivot_entries_from_objects() {
        let entries = pivot_entries(
            "users",
            operation(ArgumentValue::List(vec![pivot_object(json!(3), "m")])),
        )
        .expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, json!(3));
        assert_eq!(entries[0].attributes.get("meta"), Some(&json!("m")));
        assert!(entries[0].attributes.get("id").is_none());
    }

    #[test]
    fn test_pivot_shape_follows_first_element() {
        let err = pivot_entries(
            "users",
            operation(ArgumentValue::List(vec![
                pivot_object(json!(3), "m"),
                ArgumentValue::Scalar(json!(4)),
            ])),
        )
        .expect_err("mixed shapes");
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_single_key_is_a_list_of_one() {
        let keys = expect_keys("tasks", operation(ArgumentValue::Scalar(json!(7)))).expect("keys");
        assert_eq!(keys, vec![json!(7)]);
    }

    #[test]
    fn test_morph_type_name() {
        let name = morph_type_name("imageable", Some(&ArgumentValue::Scalar(json!("Post"))))
            .expect("type");
        assert_eq!(name, "Post");
        assert!(morph_type_name("imageable", None).is_err());
        assert!(morph_type_name("imageable", Some(&ArgumentValue::Null)).is_err());
    }

    #[test]
    fn test_morph_type_must_be_a_name() {
        for value in [json!(1), json!(true), json!("")] {
            let err = morph_type_name("imageable", Some(&ArgumentValue::Scalar(value)))
                .expect_err("not a model name");
            assert!(matches!(err, EngineError::InvalidInput { .. }));
        }
    }

    #[test]
    fn test_relation_field_must_be_an_object() {
        assert!(operations_input("user", ArgumentValue::Null)
            .expect("null is fine")
            .is_none());
        let err = operations_input("user", ArgumentValue::Scalar(json!(1))).expect_err("scalar");
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
