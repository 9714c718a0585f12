//! Utility functions for mutation execution

use crate::core::record::Record;
use crate::schema::gql_value_to_json;
use graphql_parser::query::{Field, Selection, SelectionSet, Value as GqlValue, VariableDefinition};
use serde_json::{Map, Value};

/// Supplied variables, completed with the defaults of the operation's definitions
pub fn resolve_variables(
    definitions: &[VariableDefinition<'_, String>],
    mut supplied: Map<String, Value>,
) -> Map<String, Value> {
    for definition in definitions {
        if supplied.contains_key(&definition.name) {
            continue;
        }
        if let Some(default) = &definition.default_value {
            let value = gql_value_to_json(default, &Map::new());
            supplied.insert(definition.name.clone(), value);
        }
    }
    supplied
}

/// Field arguments as a JSON object; unreferenced variables are left out
pub fn arguments_to_map(
    arguments: &[(String, GqlValue<'_, String>)],
    variables: &Map<String, Value>,
) -> Map<String, Value> {
    arguments
        .iter()
        .filter(|(_, value)| match value {
            GqlValue::Variable(name) => variables.contains_key(name),
            _ => true,
        })
        .map(|(name, value)| (name.clone(), gql_value_to_json(value, variables)))
        .collect()
}

/// Name the result of a field is returned under
pub fn response_key<'a>(field: &'a Field<'_, String>) -> &'a str {
    field.alias.as_deref().unwrap_or(&field.name)
}

/// Project the selected top-level fields of `record`
///
/// With no selection the whole record is returned. Relations are not
/// loaded, so nested selections resolve to the stored attribute or null.
pub fn project(record: &Record, selection_set: &SelectionSet<'_, String>) -> Value {
    if selection_set.items.is_empty() {
        return record.to_json();
    }

    let mut result = Map::new();
    for selection in &selection_set.items {
        if let Selection::Field(field) = selection {
            let value = match field.name.as_str() {
                "__typename" => Value::String(record.model().to_string()),
                name => record.get(name).cloned().unwrap_or(Value::Null),
            };
            result.insert(response_key(field).to_string(), value);
        }
    }
    Value::Object(result)
}
