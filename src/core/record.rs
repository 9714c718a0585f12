//! Records handed to and returned by the persistence layer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row of some model, as loaded from or about to be written to a store
///
/// Attributes are plain JSON values; the store decides how they map to its
/// own columns. `exists` is set by the store once the record is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    model: String,
    attributes: Map<String, Value>,
    #[serde(default)]
    exists: bool,
}

impl Record {
    /// A new, unsaved record of `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            attributes: Map::new(),
            exists: false,
        }
    }

    /// A record that is already persisted with the given attributes
    pub fn existing(model: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            model: model.into(),
            attributes,
            exists: true,
        }
    }

    /// A reference to an existing row carrying only its key
    pub fn placeholder(model: impl Into<String>, key_name: &str, key: Value) -> Self {
        let mut attributes = Map::new();
        attributes.insert(key_name.to_string(), key);
        Self::existing(model, attributes)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn mark_persisted(&mut self) {
        self.exists = true;
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: Value) {
        self.attributes.insert(attribute.into(), value);
    }

    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.attributes.remove(attribute)
    }

    /// Merge attributes onto the record, overwriting existing values
    pub fn fill(&mut self, attributes: Map<String, Value>) {
        for (name, value) in attributes {
            self.attributes.insert(name, value);
        }
    }

    /// The value of the key attribute, if set and not null
    pub fn key(&self, key_name: &str) -> Option<&Value> {
        self.get(key_name).filter(|value| !value.is_null())
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.attributes.clone())
    }
}
