//! Type descriptors for input values
//!
//! A [`TypeDescriptor`] is the engine's view of a GraphQL type reference:
//! either a named type or a list wrapping another descriptor, each carrying
//! its own nullability flag.

use graphql_parser::schema::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a scalar, enum or object type by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedType {
    pub name: String,
    pub non_null: bool,
}

/// A list of another type; lists may nest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListType {
    pub element: Box<TypeDescriptor>,
    pub non_null: bool,
}

/// The declared type of an argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Named(NamedType),
    List(ListType),
}

impl TypeDescriptor {
    /// A nullable named type
    pub fn named(name: impl Into<String>) -> Self {
        TypeDescriptor::Named(NamedType {
            name: name.into(),
            non_null: false,
        })
    }

    /// A nullable list of `element`
    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(ListType {
            element: Box::new(element),
            non_null: false,
        })
    }

    /// Mark this descriptor as non-null
    pub fn non_null(mut self) -> Self {
        match &mut self {
            TypeDescriptor::Named(named) => named.non_null = true,
            TypeDescriptor::List(list) => list.non_null = true,
        }
        self
    }

    pub fn is_non_null(&self) -> bool {
        match self {
            TypeDescriptor::Named(named) => named.non_null,
            TypeDescriptor::List(list) => list.non_null,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TypeDescriptor::List(_))
    }

    /// Unwrap all list layers down to the named type
    ///
    /// Always terminates: a list owns its element, so the chain is finite.
    pub fn innermost(&self) -> &NamedType {
        let mut current = self;
        loop {
            match current {
                TypeDescriptor::Named(named) => return named,
                TypeDescriptor::List(list) => current = &list.element,
            }
        }
    }

    /// Name of the innermost named type
    pub fn type_name(&self) -> &str {
        &self.innermost().name
    }
}

impl From<&Type<'_, String>> for TypeDescriptor {
    fn from(value: &Type<'_, String>) -> Self {
        match value {
            Type::NamedType(name) => TypeDescriptor::named(name.clone()),
            Type::ListType(inner) => TypeDescriptor::list(TypeDescriptor::from(inner.as_ref())),
            Type::NonNullType(inner) => TypeDescriptor::from(inner.as_ref()).non_null(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Named(named) => write!(f, "{}", named.name)?,
            TypeDescriptor::List(list) => write!(f, "[{}]", list.element)?,
        }
        if self.is_non_null() {
            write!(f, "!")?;
        }
        Ok(())
    }
}
