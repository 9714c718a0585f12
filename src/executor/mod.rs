//! GraphQL mutation executor
//!
//! Drives the engine from mutation documents:
//! - `core`: document parsing, operation dispatch and transactions
//! - `mutation_executor`: root field to engine operation
//! - `utils`: variables, argument conversion and result projection

mod core;
mod mutation_executor;
mod utils;

pub use self::core::MutationExecutor;
pub use mutation_executor::RootOperation;
