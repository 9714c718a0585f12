//! Core mutation executor orchestration

use graphql_parser::query::{Definition, Document, OperationDefinition, Selection, parse_query};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::mutation_executor;
use super::utils;
use crate::core::error::{EngineError, EngineResult};
use crate::core::store::RecordStore;
use crate::execution::MutationEngine;
use crate::schema::TypeRegistry;

/// Executes GraphQL mutation documents against a record store
///
/// Each top-level mutation field runs in its own transaction: it is
/// committed when the field resolves and rolled back when it fails, in
/// which case the remaining fields are not run.
pub struct MutationExecutor {
    registry: Arc<TypeRegistry>,
    engine: MutationEngine,
}

impl MutationExecutor {
    /// Create a new executor over the given schema and store
    pub fn new(registry: Arc<TypeRegistry>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            registry,
            engine: MutationEngine::new(store),
        }
    }

    pub fn engine(&self) -> &MutationEngine {
        &self.engine
    }

    /// Execute a mutation document and return the result as JSON
    pub async fn execute(
        &self,
        document: &str,
        variables: Option<Map<String, Value>>,
    ) -> EngineResult<Value> {
        let doc = parse_query::<String>(document)
            .map_err(|e| EngineError::invalid_input(format!("Failed to parse document: {}", e)))?;

        let result = self
            .execute_document(&doc, variables.unwrap_or_default())
            .await?;

        Ok(json!({
            "data": result
        }))
    }

    /// Execute a parsed document
    async fn execute_document(
        &self,
        doc: &Document<'_, String>,
        variables: Map<String, Value>,
    ) -> EngineResult<Value> {
        let operation = doc
            .definitions
            .iter()
            .find_map(|def| match def {
                Definition::Operation(op) => Some(op),
                Definition::Fragment(_) => None,
            })
            .ok_or_else(|| EngineError::invalid_input("No operation found in document"))?;

        match operation {
            OperationDefinition::Mutation(mutation) => {
                let variables = utils::resolve_variables(&mutation.variable_definitions, variables);
                self.execute_mutation(&mutation.selection_set.items, &variables)
                    .await
            }
            OperationDefinition::Query(_) | OperationDefinition::SelectionSet(_) => Err(
                EngineError::invalid_input("Queries are not supported, send a mutation"),
            ),
            OperationDefinition::Subscription(_) => {
                Err(EngineError::invalid_input("Subscriptions are not supported"))
            }
        }
    }

    /// Execute the fields of a mutation operation in order
    async fn execute_mutation(
        &self,
        selections: &[Selection<'_, String>],
        variables: &Map<String, Value>,
    ) -> EngineResult<Value> {
        let mut result = Map::new();

        for selection in selections {
            if let Selection::Field(field) = selection {
                let store = self.engine.store();

                store.begin().await?;
                tracing::debug!(field = %field.name, "Transaction started");

                let resolved = mutation_executor::resolve_mutation_field(
                    &self.registry,
                    &self.engine,
                    field,
                    variables,
                )
                .await;

                match resolved {
                    Ok(value) => {
                        store.commit().await?;
                        tracing::debug!(field = %field.name, "Transaction committed");
                        result.insert(utils::response_key(field).to_string(), value);
                    }
                    Err(e) => {
                        tracing::warn!(field = %field.name, error = %e, "Rolling back mutation");
                        if let Err(rollback) = store.rollback().await {
                            tracing::error!(error = %rollback, "Rollback failed");
                        }
                        return Err(e);
                    }
                }
            }
        }

        Ok(Value::Object(result))
    }
}
