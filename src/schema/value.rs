//! GraphQL literal to JSON conversion

use graphql_parser::query::Value as GqlValue;
use serde_json::{Map, Value, json};

/// Convert a GraphQL literal to JSON, resolving `$variables` from `variables`
///
/// An input-object field bound to an unset variable is left out, so it stays
/// undefined. Anywhere else an unset variable becomes `null`.
pub fn gql_value_to_json(value: &GqlValue<'_, String>, variables: &Map<String, Value>) -> Value {
    match value {
        GqlValue::Null => Value::Null,
        GqlValue::Int(i) => i.as_i64().map(|i| json!(i)).unwrap_or(Value::Null),
        GqlValue::Float(f) => json!(f),
        GqlValue::String(s) => json!(s),
        GqlValue::Boolean(b) => json!(b),
        GqlValue::Enum(e) => json!(e),
        GqlValue::List(list) => Value::Array(
            list.iter()
                .map(|item| gql_value_to_json(item, variables))
                .collect(),
        ),
        GqlValue::Object(obj) => Value::Object(
            obj.iter()
                .filter(|(_, v)| !is_unset_variable(v, variables))
                .map(|(k, v)| (k.clone(), gql_value_to_json(v, variables)))
                .collect(),
        ),
        GqlValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
    }
}

fn is_unset_variable(value: &GqlValue<'_, String>, variables: &Map<String, Value>) -> bool {
    matches!(value, GqlValue::Variable(name) if !variables.contains_key(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_parser::query::{Definition, OperationDefinition, Selection, parse_query};

    fn first_argument(query: &str) -> Value {
        let mut variables = Map::new();
        variables.insert("name".to_string(), json!("from-var"));

        let doc = parse_query::<String>(query).expect("query should parse");
        let Definition::Operation(OperationDefinition::Mutation(mutation)) = &doc.definitions[0]
        else {
            panic!("expected mutation");
        };
        let Selection::Field(field) = &mutation.selection_set.items[0] else {
            panic!("expected field");
        };
        gql_value_to_json(&field.arguments[0].1, &variables)
    }

    #[test]
    fn test_object_literal() {
        let value = first_argument(
            r#"mutation { createTask(input: {name: "foo", done: false, rank: 2, tags: [A, B], due: null}) { id } }"#,
        );
        assert_eq!(
            value,
            json!({"name": "foo", "done": false, "rank": 2, "tags": ["A", "B"], "due": null})
        );
    }

    #[test]
    fn test_variables_are_resolved() {
        let value = first_argument(
            r#"mutation($name: String) { createTask(input: {name: $name, other: $missing}) { id } }"#,
        );
        assert_eq!(value, json!({"name": "from-var"}));
    }

    #[test]
    fn test_unset_variable_in_list_is_null() {
        let value = first_argument(
            r#"mutation($name: String) { createTask(input: {tags: [$name, $missing]}) { id } }"#,
        );
        assert_eq!(value, json!({"tags": ["from-var", null]}));
    }

    #[test]
    fn test_unset_variable_in_nested_object_is_dropped() {
        let value = first_argument(
            r#"mutation { createTask(input: {user: {connect: $missing}, name: "t"}) { id } }"#,
        );
        assert_eq!(value, json!({"user": {}, "name": "t"}));
    }
}
