//! Builds typed argument trees from raw input values

use crate::core::argument::{Argument, ArgumentSet, ArgumentValue};
use crate::core::directive::Directive;
use crate::core::error::{DefinitionError, EngineError, EngineResult};
use crate::core::types::TypeDescriptor;
use crate::schema::{FieldDefinition, ObjectField, TypeKind, TypeRegistry};
use serde_json::{Map, Value};

/// Wraps raw input values with their schema types
///
/// Only the supplied data is walked, so self-referencing input types are
/// fine: recursion stops where the client's data stops.
pub struct ArgumentSetBuilder<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> ArgumentSetBuilder<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Build a set from raw values and the definitions of the fields they fill
    pub fn build(
        &self,
        raw: &Map<String, Value>,
        definitions: &[FieldDefinition],
    ) -> EngineResult<ArgumentSet> {
        let mut set = ArgumentSet::new();

        for definition in definitions {
            let argument = match raw.get(&definition.name) {
                Some(value) => Argument::new(
                    self.wrap(value, &definition.ty, &definition.directives)?,
                    definition.ty.clone(),
                )
                .with_directives(definition.directives.clone()),
                None => {
                    set.insert_undefined(
                        definition.name.clone(),
                        Argument::undefined(definition.ty.clone())
                            .with_directives(definition.directives.clone()),
                    );
                    continue;
                }
            };
            set.insert(definition.name.clone(), argument);
        }

        for key in raw.keys() {
            if !definitions.iter().any(|d| &d.name == key) {
                tracing::warn!(field = %key, "Ignoring input value with no field definition");
            }
        }

        Ok(set)
    }

    /// Build a set for an input object type
    pub fn build_input(&self, raw: &Map<String, Value>, type_name: &str) -> EngineResult<ArgumentSet> {
        let definitions = self.registry.input_fields(type_name)?;
        self.build(raw, definitions)
    }

    fn wrap(
        &self,
        value: &Value,
        ty: &TypeDescriptor,
        directives: &[Directive],
    ) -> EngineResult<ArgumentValue> {
        if value.is_null() {
            return Ok(ArgumentValue::Null);
        }

        match ty {
            TypeDescriptor::List(list) => match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| self.wrap(item, &list.element, directives))
                    .collect::<EngineResult<Vec<_>>>()
                    .map(ArgumentValue::List),
                // A single value where a list is expected is kept as-is
                single => self.wrap(single, &list.element, directives),
            },
            TypeDescriptor::Named(named) => match self.registry.kind(&named.name) {
                None => Err(DefinitionError::UnknownType {
                    type_name: named.name.clone(),
                }
                .into()),
                Some(TypeKind::InputObject) => {
                    let Value::Object(fields) = value else {
                        return Err(EngineError::invalid_input(format!(
                            "expected an object for {}, got {}",
                            named.name, value
                        )));
                    };
                    let set = self
                        .build_input(fields, &named.name)?
                        .with_directives(directives.to_vec());
                    Ok(ArgumentValue::Set(set))
                }
                Some(_) => Ok(ArgumentValue::Scalar(value.clone())),
            },
        }
    }
}

/// Build the argument tree for a call of `field` with raw arguments `raw`
///
/// The resulting set carries the field's directives.
pub fn build_argument_tree(
    registry: &TypeRegistry,
    raw: &Map<String, Value>,
    field: &ObjectField,
) -> EngineResult<ArgumentSet> {
    Ok(ArgumentSetBuilder::new(registry)
        .build(raw, &field.arguments)?
        .with_directives(field.directives.clone()))
}
