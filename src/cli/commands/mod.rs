//! Subcommand implementations.

pub mod completions;
pub mod generate;
pub mod queries;
pub mod schema;
pub mod validate;
