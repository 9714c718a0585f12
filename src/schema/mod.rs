//! Type-system lookups over a parsed GraphQL schema
//!
//! The [`TypeRegistry`] indexes an SDL document once and answers the two
//! questions the argument builder asks: what kind of type is this name, and
//! what are the fields of this input object, in declaration order.

mod value;

pub use value::gql_value_to_json;

use crate::core::directive::Directive;
use crate::core::error::{DefinitionError, EngineResult};
use crate::core::types::TypeDescriptor;
use graphql_parser::schema::{self, Definition, Document, TypeDefinition, TypeExtension};
use serde_json::{Map, Value};
use std::collections::HashMap;

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// The kind of a named type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Enum,
    InputObject,
    Object,
    Interface,
    Union,
}

/// An input field or field argument
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: TypeDescriptor,
    pub default_value: Option<Value>,
    pub directives: Vec<Directive>,
}

/// A field of an object type, e.g. a root mutation
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub name: String,
    pub arguments: Vec<FieldDefinition>,
    pub ty: TypeDescriptor,
    pub directives: Vec<Directive>,
}

impl ObjectField {
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        crate::core::directive::find(&self.directives, name)
    }
}

/// Index of the named types in a schema
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    kinds: HashMap<String, TypeKind>,
    input_fields: HashMap<String, Vec<FieldDefinition>>,
    object_fields: HashMap<String, Vec<ObjectField>>,
    mutation_type: String,
}

impl TypeRegistry {
    /// Parse SDL text and index it
    pub fn from_sdl(sdl: &str) -> EngineResult<Self> {
        let document =
            graphql_parser::parse_schema::<String>(sdl).map_err(|e| DefinitionError::InvalidSchema {
                message: e.to_string(),
            })?;
        Ok(Self::from_document(&document))
    }

    /// Index an already parsed schema document
    pub fn from_document(document: &Document<'_, String>) -> Self {
        let mut registry = Self {
            kinds: BUILTIN_SCALARS
                .iter()
                .map(|name| (name.to_string(), TypeKind::Scalar))
                .collect(),
            input_fields: HashMap::new(),
            object_fields: HashMap::new(),
            mutation_type: "Mutation".to_string(),
        };

        for definition in &document.definitions {
            match definition {
                Definition::SchemaDefinition(schema_def) => {
                    if let Some(mutation) = &schema_def.mutation {
                        registry.mutation_type = mutation.clone();
                    }
                }
                Definition::TypeDefinition(type_def) => registry.add_type(type_def),
                Definition::TypeExtension(extension) => registry.add_extension(extension),
                Definition::DirectiveDefinition(_) => {}
            }
        }

        registry
    }

    fn add_type(&mut self, type_def: &TypeDefinition<'_, String>) {
        match type_def {
            TypeDefinition::Scalar(t) => {
                self.kinds.insert(t.name.clone(), TypeKind::Scalar);
            }
            TypeDefinition::Enum(t) => {
                self.kinds.insert(t.name.clone(), TypeKind::Enum);
            }
            TypeDefinition::Union(t) => {
                self.kinds.insert(t.name.clone(), TypeKind::Union);
            }
            TypeDefinition::Interface(t) => {
                self.kinds.insert(t.name.clone(), TypeKind::Interface);
            }
            TypeDefinition::Object(t) => {
                self.kinds.insert(t.name.clone(), TypeKind::Object);
                self.object_fields
                    .entry(t.name.clone())
                    .or_default()
                    .extend(t.fields.iter().map(convert_object_field));
            }
            TypeDefinition::InputObject(t) => {
                self.kinds.insert(t.name.clone(), TypeKind::InputObject);
                self.input_fields
                    .entry(t.name.clone())
                    .or_default()
                    .extend(t.fields.iter().map(convert_input_value));
            }
        }
    }

    fn add_extension(&mut self, extension: &TypeExtension<'_, String>) {
        match extension {
            TypeExtension::Object(t) => {
                self.kinds.entry(t.name.clone()).or_insert(TypeKind::Object);
                self.object_fields
                    .entry(t.name.clone())
                    .or_default()
                    .extend(t.fields.iter().map(convert_object_field));
            }
            TypeExtension::InputObject(t) => {
                self.kinds
                    .entry(t.name.clone())
                    .or_insert(TypeKind::InputObject);
                self.input_fields
                    .entry(t.name.clone())
                    .or_default()
                    .extend(t.fields.iter().map(convert_input_value));
            }
            _ => {}
        }
    }

    pub fn kind(&self, type_name: &str) -> Option<TypeKind> {
        self.kinds.get(type_name).copied()
    }

    pub fn is_input_object(&self, type_name: &str) -> bool {
        self.kind(type_name) == Some(TypeKind::InputObject)
    }

    /// Name of the root mutation type
    pub fn mutation_type(&self) -> &str {
        &self.mutation_type
    }

    /// Fields of an input object type, in declaration order
    pub fn input_fields(&self, type_name: &str) -> EngineResult<&[FieldDefinition]> {
        match self.kind(type_name) {
            None => Err(DefinitionError::UnknownType {
                type_name: type_name.to_string(),
            }
            .into()),
            Some(TypeKind::InputObject) => Ok(self
                .input_fields
                .get(type_name)
                .map(Vec::as_slice)
                .unwrap_or_default()),
            Some(_) => Err(DefinitionError::NotAnInputType {
                type_name: type_name.to_string(),
            }
            .into()),
        }
    }

    pub fn input_field(&self, type_name: &str, field: &str) -> EngineResult<&FieldDefinition> {
        self.input_fields(type_name)?
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| {
                DefinitionError::UnknownField {
                    type_name: type_name.to_string(),
                    field: field.to_string(),
                }
                .into()
            })
    }

    /// A field of an object type, e.g. `object_field("Mutation", "createUser")`
    pub fn object_field(&self, type_name: &str, field: &str) -> EngineResult<&ObjectField> {
        let fields = self
            .object_fields
            .get(type_name)
            .ok_or_else(|| DefinitionError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        fields.iter().find(|f| f.name == field).ok_or_else(|| {
            DefinitionError::UnknownField {
                type_name: type_name.to_string(),
                field: field.to_string(),
            }
            .into()
        })
    }

    pub fn mutation_field(&self, field: &str) -> EngineResult<&ObjectField> {
        self.object_field(&self.mutation_type, field)
    }
}

fn convert_directives(directives: &[schema::Directive<'_, String>]) -> Vec<Directive> {
    let no_variables = Map::new();
    directives
        .iter()
        .map(|d| Directive {
            name: d.name.clone(),
            arguments: d
                .arguments
                .iter()
                .map(|(name, value)| (name.clone(), gql_value_to_json(value, &no_variables)))
                .collect(),
        })
        .collect()
}

fn convert_input_value(input: &schema::InputValue<'_, String>) -> FieldDefinition {
    FieldDefinition {
        name: input.name.clone(),
        ty: TypeDescriptor::from(&input.value_type),
        default_value: input
            .default_value
            .as_ref()
            .map(|v| gql_value_to_json(v, &Map::new())),
        directives: convert_directives(&input.directives),
    }
}

fn convert_object_field(field: &schema::Field<'_, String>) -> ObjectField {
    ObjectField {
        name: field.name.clone(),
        arguments: field.arguments.iter().map(convert_input_value).collect(),
        ty: TypeDescriptor::from(&field.field_type),
        directives: convert_directives(&field.directives),
    }
}
