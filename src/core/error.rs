//! Typed errors for argument building and mutation resolution
//!
//! # Error Categories
//!
//! - [`DefinitionError`]: the schema or model configuration is broken. Fatal,
//!   never caused by client input.
//! - [`EngineError::MissingPrimaryKey`]: an update-style operation did not
//!   identify its target.
//! - [`EngineError::NotFound`]: an update targets a key with no record.
//! - [`EngineError::Unsupported`]: the operation is not available for the
//!   relation it was used on.
//! - [`EngineError::InvalidInput`]: client data has the wrong shape.
//! - [`EngineError::Store`]: the persistence layer failed.
//!
//! Errors propagate unmodified to the caller of the mutation, which owns the
//! transaction and is expected to roll back on any of them.
//!
//! ```rust,ignore
//! match engine.update("Company", args).await {
//!     Ok(company) => println!("{}", company.to_json()),
//!     Err(EngineError::NotFound { model, id }) => println!("no {} {}", model, id),
//!     Err(e) => eprintln!("{}", e.to_response().message),
//! }
//! ```

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the engine
pub type EngineResult<T> = Result<T, EngineError>;

/// The main error type of the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The schema or model configuration is broken
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// An update or upsert could not find an identifying field
    #[error("Missing primary key for update of {model}")]
    MissingPrimaryKey { model: String },

    /// No record matches the given key
    #[error("{model} with id '{id}' not found")]
    NotFound { model: String, id: Value },

    /// The operation is not available on this relation
    #[error("Operation '{operation}' is not supported on {relation}")]
    Unsupported { relation: String, operation: String },

    /// Client data has the wrong shape
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The persistence layer reported a failure
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Schema and configuration errors
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// No type of that name is defined
    #[error("Unknown type: {type_name}")]
    UnknownType { type_name: String },

    /// The type has no field of that name
    #[error("Unknown field '{field}' on type {type_name}")]
    UnknownField { type_name: String, field: String },

    /// The type exists but cannot carry input fields
    #[error("Type {type_name} is not an input object")]
    NotAnInputType { type_name: String },

    /// The schema or model configuration is malformed
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },
}

/// Error payload handed to the API layer
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EngineError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unsupported(relation: impl Into<String>, operation: impl Into<String>) -> Self {
        EngineError::Unsupported {
            relation: relation.into(),
            operation: operation.into(),
        }
    }

    /// Fatal errors indicate a broken deployment rather than a bad request
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Definition(_))
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::Definition(e) => e.error_code(),
            EngineError::MissingPrimaryKey { .. } => "MISSING_PRIMARY_KEY",
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::Unsupported { .. } => "UNSUPPORTED_OPERATION",
            EngineError::InvalidInput { .. } => "INVALID_INPUT",
            EngineError::Store(_) => "STORE_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            EngineError::NotFound { model, id } => Some(serde_json::json!({
                "model": model,
                "id": id,
            })),
            EngineError::MissingPrimaryKey { model } => Some(serde_json::json!({ "model": model })),
            EngineError::Unsupported {
                relation,
                operation,
            } => Some(serde_json::json!({
                "relation": relation,
                "operation": operation,
            })),
            _ => None,
        }
    }
}

impl DefinitionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DefinitionError::UnknownType { .. } => "UNKNOWN_TYPE",
            DefinitionError::UnknownField { .. } => "UNKNOWN_FIELD",
            DefinitionError::NotAnInputType { .. } => "NOT_AN_INPUT_TYPE",
            DefinitionError::InvalidSchema { .. } => "INVALID_SCHEMA",
        }
    }
}
