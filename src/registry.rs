//! Registry of compiled type definitions
//!
//! A registry is an explicit value built once from a set of declarations.
//! Models are created from it by type, and the database can create the
//! whole schema from it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Entity, Model};
use crate::schema::{self, CompileReport, EntityDeclaration, MappingError, TypeDefinition};
use crate::storage::Database;
use crate::{Error, Result};

/// Collects declarations before compilation.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    declarations: Vec<EntityDeclaration>,
    errors: Vec<MappingError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type through its declaration.
    pub fn register<T: Entity>(mut self) -> Self {
        let declaration = T::declaration();
        if declaration.name != T::TYPE_NAME {
            self.errors.push(
                MappingError::new(format!(
                    "declaration is named {} but the type is registered as {}",
                    declaration.name,
                    T::TYPE_NAME
                ))
                .with_entity(T::TYPE_NAME),
            );
            return self;
        }
        self.declarations.push(declaration);
        self
    }

    pub fn declare(mut self, declaration: EntityDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn declare_all(mut self, declarations: impl IntoIterator<Item = EntityDeclaration>) -> Self {
        self.declarations.extend(declarations);
        self
    }

    /// Compile everything, keeping the definitions that succeeded.
    pub fn compile(self) -> (Registry, Vec<MappingError>) {
        let mut report = schema::compile(&self.declarations);
        let mut errors = self.errors;
        errors.append(&mut report.errors);
        (Registry::from_report(report), errors)
    }

    /// Compile everything, failing if any declaration is invalid.
    pub fn build(self) -> Result<Registry> {
        let (registry, errors) = self.compile();
        if errors.is_empty() {
            Ok(registry)
        } else {
            Err(Error::Schema(errors))
        }
    }
}

/// Compiled definitions keyed by type name.
#[derive(Debug, Default)]
pub struct Registry {
    definitions: Vec<Arc<TypeDefinition>>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn from_report(report: CompileReport) -> Self {
        let mut registry = Self::default();
        for definition in report.definitions {
            registry
                .by_name
                .insert(definition.type_name().to_string(), registry.definitions.len());
            registry.definitions.push(Arc::new(definition));
        }
        tracing::debug!("Registry holds {} type(s)", registry.definitions.len());
        registry
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<TypeDefinition>> {
        self.by_name.get(type_name).map(|&i| &self.definitions[i])
    }

    /// Definition registered for `T`.
    pub fn definition<T: Entity>(&self) -> Result<Arc<TypeDefinition>> {
        self.get(T::TYPE_NAME)
            .cloned()
            .ok_or_else(|| Error::UnknownType(T::TYPE_NAME.to_string()))
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.iter().map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Create the persistence engine for `T` over `db`.
    pub fn model<T: Entity>(&self, db: Arc<Database>) -> Result<Model<T>> {
        Ok(Model::new(self.definition::<T>()?, db))
    }

    /// DDL script for every registered type.
    pub fn ddl(&self) -> String {
        self.definitions()
            .map(|d| d.ddl())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDeclaration;

    fn tag() -> EntityDeclaration {
        EntityDeclaration::new("Tag")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("label", "String"))
    }

    #[test]
    fn test_build_and_lookup() {
        let registry = Registry::builder().declare(tag()).build().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Tag").unwrap().table_name(), "Tag");
        assert!(registry.get("Missing").is_none());
        assert!(registry.ddl().starts_with("CREATE TABLE Tag"));
    }

    #[test]
    fn test_build_fails_with_all_errors() {
        let broken = EntityDeclaration::new("Broken").field(FieldDeclaration::column("x", "i32"));
        let result = Registry::builder().declare(tag()).declare(broken).build();
        match result {
            Err(Error::Schema(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].entity.as_deref(), Some("Broken"));
            }
            other => panic!("expected schema error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_lenient_compile_keeps_valid_types() {
        let broken = EntityDeclaration::new("Broken").field(FieldDeclaration::column("x", "i32"));
        let (registry, errors) = Registry::builder().declare(broken).declare(tag()).compile();
        assert_eq!(errors.len(), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("Tag").is_some());
    }
}
