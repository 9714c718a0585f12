//! Argument tree construction

pub mod builder;

pub use builder::{ArgumentSetBuilder, build_argument_tree};
