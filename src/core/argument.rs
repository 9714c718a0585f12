//! The typed argument tree
//!
//! An [`ArgumentSet`] holds the fields of one input object, split into the
//! ones the client supplied (`arguments`) and the ones it left out
//! (`undefined`). A field name is never in both maps. Each field's
//! [`ArgumentValue`] distinguishes three states explicitly: a value, an
//! explicit `null`, and [`ArgumentValue::Undefined`] for fields that were not
//! supplied at all.

use crate::core::directive::{self, Directive};
use crate::core::types::TypeDescriptor;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A client-supplied value, recursively typed
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// The field was not supplied
    Undefined,
    /// The field was supplied as an explicit `null`
    Null,
    /// A scalar or enum value, kept as decoded from the wire
    Scalar(Value),
    /// A nested input object
    Set(ArgumentSet),
    /// A list of values, each independently typed
    List(Vec<ArgumentValue>),
}

impl ArgumentValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ArgumentValue::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, ArgumentValue::Undefined)
    }

    pub fn as_set(&self) -> Option<&ArgumentSet> {
        match self {
            ArgumentValue::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ArgumentValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Treat the value as a list: lists yield their items, null and
    /// undefined yield nothing, anything else is a single item.
    pub fn into_vec(self) -> Vec<ArgumentValue> {
        match self {
            ArgumentValue::List(items) => items,
            ArgumentValue::Null | ArgumentValue::Undefined => Vec::new(),
            other => vec![other],
        }
    }

    /// Loose truthiness used by signal-only operations such as `disconnect: true`.
    ///
    /// `false`, `0`, `""`, `"0"`, empty lists, empty objects, null and
    /// undefined are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ArgumentValue::Undefined | ArgumentValue::Null => false,
            ArgumentValue::Scalar(value) => match value {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                Value::String(s) => !(s.is_empty() || s == "0"),
                Value::Array(items) => !items.is_empty(),
                Value::Object(map) => !map.is_empty(),
            },
            ArgumentValue::Set(set) => !set.is_empty(),
            ArgumentValue::List(items) => !items.is_empty(),
        }
    }

    /// Flatten back to a plain JSON value
    pub fn to_plain(&self) -> Value {
        match self {
            ArgumentValue::Undefined | ArgumentValue::Null => Value::Null,
            ArgumentValue::Scalar(value) => value.clone(),
            ArgumentValue::Set(set) => set.to_plain(),
            ArgumentValue::List(items) => {
                Value::Array(items.iter().map(ArgumentValue::to_plain).collect())
            }
        }
    }

    fn spread(self) -> Self {
        match self {
            ArgumentValue::Set(set) => ArgumentValue::Set(set.spread()),
            ArgumentValue::List(items) => {
                ArgumentValue::List(items.into_iter().map(ArgumentValue::spread).collect())
            }
            other => other,
        }
    }

    fn rename(self) -> Self {
        match self {
            ArgumentValue::Set(set) => ArgumentValue::Set(set.rename()),
            ArgumentValue::List(items) => {
                ArgumentValue::List(items.into_iter().map(ArgumentValue::rename).collect())
            }
            other => other,
        }
    }

    fn remove_undefined(self) -> Self {
        match self {
            ArgumentValue::Set(set) => ArgumentValue::Set(set.remove_undefined()),
            ArgumentValue::List(items) => ArgumentValue::List(
                items
                    .into_iter()
                    .filter(|item| !item.is_undefined())
                    .map(ArgumentValue::remove_undefined)
                    .collect(),
            ),
            other => other,
        }
    }
}

/// One input value together with its declared type and directives
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub value: ArgumentValue,
    pub ty: TypeDescriptor,
    pub directives: Vec<Directive>,
}

impl Argument {
    pub fn new(value: ArgumentValue, ty: TypeDescriptor) -> Self {
        Self {
            value,
            ty,
            directives: Vec::new(),
        }
    }

    /// An argument for a field the client did not supply
    pub fn undefined(ty: TypeDescriptor) -> Self {
        Self::new(ArgumentValue::Undefined, ty)
    }

    pub fn with_directives(mut self, directives: Vec<Directive>) -> Self {
        self.directives = directives;
        self
    }

    pub fn directive(&self, name: &str) -> Option<&Directive> {
        directive::find(&self.directives, name)
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directive(name).is_some()
    }

    pub fn to_plain(&self) -> Value {
        self.value.to_plain()
    }
}

/// The fields of one input object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSet {
    arguments: IndexMap<String, Argument>,
    undefined: IndexMap<String, Argument>,
    directives: Vec<Directive>,
}

impl ArgumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directives(mut self, directives: Vec<Directive>) -> Self {
        self.directives = directives;
        self
    }

    /// Directives inherited from the enclosing field or input type
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Record a supplied field, replacing any previous entry of that name
    pub fn insert(&mut self, name: impl Into<String>, argument: Argument) {
        let name = name.into();
        self.undefined.shift_remove(&name);
        self.arguments.insert(name, argument);
    }

    /// Record a field the client left out; ignored if it was supplied
    pub fn insert_undefined(&mut self, name: impl Into<String>, argument: Argument) {
        let name = name.into();
        if !self.arguments.contains_key(&name) {
            self.undefined.insert(name, argument);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.arguments.get(name)
    }

    /// Remove a supplied field, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<Argument> {
        self.arguments.shift_remove(name)
    }

    /// Whether `name` was supplied with a non-null value
    pub fn has(&self, name: &str) -> bool {
        self.arguments
            .get(name)
            .is_some_and(|argument| !argument.value.is_null())
    }

    /// Whether `name` was supplied, null included
    pub fn is_supplied(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    pub fn is_undefined(&self, name: &str) -> bool {
        self.undefined.contains_key(name)
    }

    /// Supplied fields in declaration order
    pub fn arguments(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.arguments.iter().map(|(name, arg)| (name.as_str(), arg))
    }

    /// Fields the client did not supply
    pub fn undefined(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.undefined.iter().map(|(name, arg)| (name.as_str(), arg))
    }

    /// Supplied fields followed by the undefined ones
    pub fn arguments_with_undefined(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.arguments().chain(self.undefined())
    }

    /// Names of the supplied fields
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arguments.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Take ownership of the supplied fields
    pub fn into_arguments(self) -> IndexMap<String, Argument> {
        self.arguments
    }

    /// Columns from an `@upsert(identifyingColumns: [...])` on this set
    pub fn identifying_columns(&self) -> Vec<String> {
        directive::identifying_columns(&self.directives)
    }

    /// Flatten the supplied fields into a JSON object; undefined fields are absent
    pub fn to_plain(&self) -> Value {
        Value::Object(self.to_map())
    }

    pub fn to_map(&self) -> Map<String, Value> {
        self.arguments
            .iter()
            .map(|(name, argument)| (name.clone(), argument.to_plain()))
            .collect()
    }

    /// Drop every undefined field, recursively
    pub fn remove_undefined(self) -> Self {
        Self {
            arguments: self
                .arguments
                .into_iter()
                .map(|(name, mut argument)| {
                    argument.value = argument.value.remove_undefined();
                    (name, argument)
                })
                .collect(),
            undefined: IndexMap::new(),
            directives: self.directives,
        }
    }

    /// Inline nested sets whose field carries `@spread`, recursively
    pub fn spread(self) -> Self {
        let mut spread = ArgumentSet::new().with_directives(self.directives);

        for (name, mut argument) in self.arguments {
            argument.value = argument.value.spread();

            if argument.has_directive(directive::SPREAD) {
                if let ArgumentValue::Set(inner) = argument.value {
                    spread.merge(inner);
                    continue;
                }
            }

            spread.insert(name, argument);
        }

        for (name, argument) in self.undefined {
            if !argument.has_directive(directive::SPREAD) {
                spread.insert_undefined(name, argument);
            }
        }

        spread
    }

    /// Re-key fields carrying `@rename(attribute: ...)`, recursively
    pub fn rename(self) -> Self {
        fn key(name: String, argument: &Argument) -> String {
            argument
                .directive(directive::RENAME)
                .and_then(|d| d.string_argument("attribute"))
                .map(str::to_string)
                .unwrap_or(name)
        }

        let mut renamed = ArgumentSet::new().with_directives(self.directives);
        for (name, mut argument) in self.arguments {
            argument.value = argument.value.rename();
            renamed.insert(key(name, &argument), argument);
        }
        for (name, argument) in self.undefined {
            renamed.insert_undefined(key(name, &argument), argument);
        }
        renamed
    }

    fn merge(&mut self, other: ArgumentSet) {
        for (name, argument) in other.arguments {
            self.insert(name, argument);
        }
        for (name, argument) in other.undefined {
            self.insert_undefined(name, argument);
        }
    }
}

impl IntoIterator for ArgumentSet {
    type Item = (String, Argument);
    type IntoIter = indexmap::map::IntoIter<String, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.arguments.into_iter()
    }
}
