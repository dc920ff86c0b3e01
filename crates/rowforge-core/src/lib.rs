//! Core contracts for rowforge.
//!
//! This crate defines the schema types consumed by the row producer, the
//! closed value and generator variants, and the validation and ordering
//! helpers shared by the generation and execution crates.

pub mod constraints;
pub mod error;
pub mod generator;
pub mod graph;
pub mod schema;
pub mod types;
pub mod validation;
pub mod value;

pub use constraints::ForeignKeyRef;
pub use error::{Error, Result};
pub use generator::{GeneratorSpec, RandomSpec};
pub use graph::{dependency_order, order_tables};
pub use schema::{Column, DatabaseSchema, Table};
pub use types::{ColumnType, IdentityGeneration};
pub use validation::validate_schema;
pub use value::Value;

/// Current contract version for schema documents.
pub const SCHEMA_VERSION: &str = "0.1";
