//! # nestmut
//!
//! A nested-mutation resolution engine for GraphQL schemas.
//!
//! A single mutation such as
//!
//! ```graphql
//! mutation {
//!   createUser(input: {name: "bar", tasks: {create: [{name: "t1"}, {name: "t2"}]}}) { id }
//! }
//! ```
//!
//! writes a user and two tasks pointing at it. The engine turns the raw
//! arguments into a typed argument tree, splits each level by when its
//! relations can be resolved relative to the owning record's save, and
//! applies the nested operations in a fixed order.
//!
//! ## Features
//!
//! - **Typed Argument Trees**: supplied, explicit `null` and omitted fields are distinct
//! - **Relation Kinds**: owning and polymorphic owning to-one, owned to-one/to-many, many-to-many
//! - **Nested Operations**: `create`, `connect`, `update`, `upsert`, `disconnect`, `delete`, `sync`, `syncWithoutDetaching`
//! - **Pluggable Persistence**: everything goes through the [`RecordStore`](core::RecordStore) trait
//! - **Configuration-Based**: declare models and relations in YAML
//! - **Transactions**: the executor commits or rolls back each mutation field as a whole
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nestmut::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(TypeRegistry::from_sdl(SDL)?);
//! let store = Arc::new(InMemoryRecordStore::new(ModelsConfig::from_yaml_file("models.yaml")?));
//! let executor = MutationExecutor::new(registry, store);
//!
//! let result = executor
//!     .execute(r#"mutation { createTask(input: {name: "foo", user: {connect: 1}}) { id user_id } }"#, None)
//!     .await?;
//! ```

pub mod arguments;
pub mod config;
pub mod core;
pub mod execution;
pub mod executor;
pub mod schema;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Argument Tree ===
    pub use crate::arguments::{ArgumentSetBuilder, build_argument_tree};
    pub use crate::core::{
        argument::{Argument, ArgumentSet, ArgumentValue},
        directive::Directive,
        types::{ListType, NamedType, TypeDescriptor},
    };

    // === Persistence ===
    pub use crate::core::{
        events::{EventEnvelope, RecordEvent},
        record::Record,
        relation::{Relation, RelationKind},
        store::{PivotEntry, RecordStore},
    };

    // === Errors ===
    pub use crate::core::error::{DefinitionError, EngineError, EngineResult, ErrorResponse};

    // === Resolution ===
    pub use crate::execution::{
        MutationEngine, NestedOperation, OperationKind, Owner, ParentRelation, Partitioned,
        ResolutionPlan, partition,
    };

    // === Schema & Config ===
    pub use crate::config::{ModelConfig, ModelsConfig};
    pub use crate::schema::{FieldDefinition, ObjectField, TypeKind, TypeRegistry};

    // === Executor ===
    pub use crate::executor::{MutationExecutor, RootOperation};

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryRecordStore;

    // === Re-exports ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
