//! # Tablemap - Declarative table mapping for SQLite
//!
//! Tablemap turns entity declarations into SQLite tables and persists
//! entities through a generic engine.
//!
//! Tablemap provides:
//! - A schema compiler turning declarations into validated table definitions and DDL
//! - Statement text builders for parameterized INSERT/UPDATE/DELETE/SELECT
//! - A per-type persistence engine with optimistic versioning and batch transactions
//! - A weak identity cache keyed by row id
//! - A criteria query builder over declared fields

pub mod sql;
pub mod schema;
pub mod registry;
pub mod storage;
pub mod model;
pub mod query;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use schema::{EntityDeclaration, FieldDeclaration, MappingError, TypeDefinition};
pub use registry::{Registry, RegistryBuilder};
pub use storage::Database;
pub use model::{Entity, FromValue, Model, Record, Value};
pub use query::{Criterion, Query, RawQuery};

/// Result type alias for Tablemap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Tablemap operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Schema error: {} declaration(s) failed to compile: {}", .0.len(), join_errors(.0))]
    Schema(Vec<MappingError>),

    #[error("Illegal state: {0}")]
    State(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Conversion error on field '{field}': {message}")]
    Conversion { field: String, message: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown entity type: {0}")]
    UnknownType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_errors(errors: &[MappingError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
