//! Core module containing the argument tree, records, relations and the store trait

pub mod argument;
pub mod directive;
pub mod error;
pub mod events;
pub mod record;
pub mod relation;
pub mod store;
pub mod types;

pub use argument::{Argument, ArgumentSet, ArgumentValue};
pub use directive::Directive;
pub use error::{DefinitionError, EngineError, EngineResult, ErrorResponse};
pub use events::{EventEnvelope, RecordEvent};
pub use record::Record;
pub use relation::{Relation, RelationKind};
pub use store::{PivotEntry, RecordStore};
pub use types::{ListType, NamedType, TypeDescriptor};
