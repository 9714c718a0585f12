//! Schema directives attached to fields and arguments

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flattens a nested input object into its parent argument set
pub const SPREAD: &str = "spread";
/// Re-keys an argument to a different attribute name: `@rename(attribute: "col")`
pub const RENAME: &str = "rename";
/// Root upsert mutation, or identifying columns for a nested upsert
pub const UPSERT: &str = "upsert";
/// Root create mutation
pub const CREATE: &str = "create";
/// Root update mutation
pub const UPDATE: &str = "update";
/// Root delete mutation
pub const DELETE: &str = "delete";

/// A directive usage with its literal arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    /// String argument, if present and a string
    pub fn string_argument(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(Value::as_str)
    }
}

/// Find the first directive named `name`
pub fn find<'a>(directives: &'a [Directive], name: &str) -> Option<&'a Directive> {
    directives.iter().find(|d| d.name == name)
}

/// Columns listed in `@upsert(identifyingColumns: [...])`, empty when absent
pub fn identifying_columns(directives: &[Directive]) -> Vec<String> {
    find(directives, UPSERT)
        .and_then(|d| d.argument("identifyingColumns"))
        .and_then(Value::as_array)
        .map(|columns| {
            columns
                .iter()
                .filter_map(|c| c.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
