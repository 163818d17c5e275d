//! Schema layer - from entity declarations to table definitions
//!
//! Declarations (`declaration`) are compiled (`compiler`) into immutable
//! [`TypeDefinition`]s. Each definition part has a builder whose `build()`
//! validates and freezes it; any violation surfaces as a [`MappingError`].

pub mod types;
pub mod naming;
pub mod constraint;
pub mod property;
pub mod index;
pub mod trigger;
pub mod definition;
pub mod declaration;
pub mod compiler;

pub use compiler::{CompileReport, compile};
pub use constraint::{ConstraintBuilder, ConstraintDefinition, ReferenceTarget};
pub use declaration::{
    CheckDeclaration, ColumnDeclaration, DateRepresentation, EntityDeclaration, FieldDeclaration,
    IdDeclaration, IndexDeclaration, NotNullDeclaration, ReferenceDeclaration, SchemaFile,
    TableDeclaration, TriggerDeclaration, UniqueDeclaration, VersionDeclaration,
};
pub use definition::{DmlStatements, TypeDefinition, TypeDefinitionBuilder};
pub use index::{IndexBuilder, IndexDefinition};
pub use property::{DEFAULT_DATE_FORMAT, PropertyBuilder, PropertyDefinition};
pub use trigger::{TriggerBuilder, TriggerDefinition};
pub use types::{
    ConflictPolicy, ConstraintKind, ConstraintScope, ReferenceAction, ScalarKind, SortOrder,
    TriggerEvent, TypeShape,
};

use std::fmt;

/// A schema declaration that cannot be turned into a valid definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingError {
    /// Entity type the error belongs to
    pub entity: Option<String>,
    /// Field within the entity, when the error is field-specific
    pub field: Option<String>,
    pub message: String,
}

impl MappingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            entity: None,
            field: None,
            message: message.into(),
        }
    }

    /// Attach the entity name unless one is already set.
    pub fn with_entity(mut self, entity: &str) -> Self {
        if self.entity.is_none() {
            self.entity = Some(entity.to_string());
        }
        self
    }

    /// Attach the field name unless one is already set.
    pub fn with_field(mut self, field: &str) -> Self {
        if self.field.is_none() {
            self.field = Some(field.to_string());
        }
        self
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.entity, &self.field) {
            (Some(entity), Some(field)) => write!(f, "{}.{}: {}", entity, field, self.message),
            (Some(entity), None) => write!(f, "{}: {}", entity, self.message),
            (None, Some(field)) => write!(f, "{}: {}", field, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for MappingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_error_context() {
        let error = MappingError::new("bad")
            .with_field("name")
            .with_entity("Person")
            .with_entity("Other");
        assert_eq!(error.to_string(), "Person.name: bad");
    }
}
