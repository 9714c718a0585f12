//! Mutation field resolution

use graphql_parser::query::Field;
use serde_json::{Map, Value};

use super::utils;
use crate::arguments::build_argument_tree;
use crate::core::directive;
use crate::core::error::{DefinitionError, EngineResult};
use crate::execution::MutationEngine;
use crate::schema::{ObjectField, TypeRegistry};

/// What a root mutation field does, from its directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootOperation {
    Create { model: String },
    Update { model: String },
    Upsert { model: String },
    Delete { model: String },
}

impl RootOperation {
    /// Read the operation from `@create`, `@update`, `@upsert` or `@delete`
    ///
    /// The model is the directive's `model:` argument, else the field's
    /// return type.
    pub fn from_field(field: &ObjectField) -> Result<Self, DefinitionError> {
        let candidates = [
            directive::CREATE,
            directive::UPDATE,
            directive::UPSERT,
            directive::DELETE,
        ];

        let found = candidates
            .iter()
            .find_map(|name| field.directive(name))
            .ok_or_else(|| DefinitionError::InvalidSchema {
                message: format!(
                    "mutation field '{}' needs one of @create, @update, @upsert or @delete",
                    field.name
                ),
            })?;

        let model = found
            .string_argument("model")
            .map(str::to_string)
            .unwrap_or_else(|| field.ty.type_name().to_string());

        Ok(match found.name.as_str() {
            directive::CREATE => RootOperation::Create { model },
            directive::UPDATE => RootOperation::Update { model },
            directive::UPSERT => RootOperation::Upsert { model },
            _ => RootOperation::Delete { model },
        })
    }
}

/// Resolve one top-level mutation field (e.g. "createUser")
pub async fn resolve_mutation_field(
    registry: &TypeRegistry,
    engine: &MutationEngine,
    field: &Field<'_, String>,
    variables: &Map<String, Value>,
) -> EngineResult<Value> {
    let definition = registry.mutation_field(&field.name)?;
    let operation = RootOperation::from_field(definition)?;

    let raw = utils::arguments_to_map(&field.arguments, variables);
    let args = build_argument_tree(registry, &raw, definition)?
        .spread()
        .rename();

    tracing::debug!(field = %field.name, operation = ?operation, "Resolving mutation field");

    let record = match &operation {
        RootOperation::Create { model } => engine.create(model, args).await?,
        RootOperation::Update { model } => engine.update(model, args).await?,
        RootOperation::Upsert { model } => engine.upsert(model, args).await?,
        RootOperation::Delete { model } => engine.delete(model, args).await?,
    };

    Ok(utils::project(&record, &field.selection_set))
}
