//! Type definitions - the compiled artifact for one entity type
//!
//! A [`TypeDefinition`] carries the table name, the id and optional version
//! columns, the remaining properties, table constraints, indexes and
//! triggers, plus every SQL text derived from them: the DDL script and the
//! INSERT/UPDATE/DELETE/SELECT statements used by the persistence engine.
//! It is immutable once built.

use crate::schema::MappingError;
use crate::schema::constraint::ConstraintDefinition;
use crate::schema::index::IndexDefinition;
use crate::schema::naming;
use crate::schema::property::PropertyDefinition;
use crate::schema::trigger::TriggerDefinition;
use crate::schema::types::{ConstraintScope, ScalarKind};
use crate::sql::{self, SelectClauses, StatementBuilder};

/// DML texts derived from a definition.
#[derive(Debug, Clone)]
pub struct DmlStatements {
    pub insert: String,
    /// None when the type has neither updatable columns nor a version column
    pub update: Option<String>,
    /// Keyed by id only; the version is not part of the delete predicate
    pub delete: String,
    pub select_by_id: String,
}

#[derive(Debug, Clone)]
pub struct TypeDefinition {
    type_name: String,
    table_name: String,
    temporary: bool,
    id: PropertyDefinition,
    version: Option<PropertyDefinition>,
    properties: Vec<PropertyDefinition>,
    constraints: Vec<ConstraintDefinition>,
    indexes: Vec<IndexDefinition>,
    triggers: Vec<TriggerDefinition>,
    create_table: String,
    dml: DmlStatements,
}

impl TypeDefinition {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn id(&self) -> &PropertyDefinition {
        &self.id
    }

    pub fn version(&self) -> Option<&PropertyDefinition> {
        self.version.as_ref()
    }

    /// Properties other than id and version, in declaration order
    pub fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }

    pub fn constraints(&self) -> &[ConstraintDefinition] {
        &self.constraints
    }

    pub fn indexes(&self) -> &[IndexDefinition] {
        &self.indexes
    }

    pub fn triggers(&self) -> &[TriggerDefinition] {
        &self.triggers
    }

    pub fn dml(&self) -> &DmlStatements {
        &self.dml
    }

    /// Every persisted property: id, then the others, then version.
    pub fn query_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        std::iter::once(&self.id)
            .chain(self.properties.iter())
            .chain(self.version.iter())
    }

    /// Properties bound by the INSERT statement, in parameter order
    pub fn insert_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties.iter().filter(|p| p.is_bindable() && p.is_insertable())
    }

    /// Properties bound by the UPDATE SET clause, in parameter order
    pub fn update_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties.iter().filter(|p| p.is_bindable() && p.is_updatable())
    }

    pub fn query_columns(&self) -> Vec<&str> {
        self.query_properties().map(|p| p.column_name()).collect()
    }

    /// Look up a persisted property by field name (exact) or column name (case-insensitive).
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.query_properties()
            .find(|p| p.field_name() == name)
            .or_else(|| {
                self.query_properties()
                    .find(|p| p.column_name().eq_ignore_ascii_case(name))
            })
    }

    /// `CREATE TABLE` statement alone
    pub fn create_table(&self) -> &str {
        &self.create_table
    }

    /// All DDL statements, table first, then indexes, then triggers.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.create_table.as_str())
            .chain(self.indexes.iter().map(|i| i.statement()))
            .chain(self.triggers.iter().map(|t| t.statement()))
    }

    /// Full DDL script, one statement per line, each terminated by `;`.
    pub fn ddl(&self) -> String {
        self.statements()
            .map(|s| format!("{};", s))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Digest of the DDL script. Two definitions with the same fingerprint
    /// produce the same schema.
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.ddl().as_bytes()).to_hex().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeDefinitionBuilder {
    type_name: String,
    table_name: String,
    temporary: bool,
    id: Option<PropertyDefinition>,
    version: Option<PropertyDefinition>,
    properties: Vec<PropertyDefinition>,
    constraints: Vec<ConstraintDefinition>,
    indexes: Vec<IndexDefinition>,
    triggers: Vec<TriggerDefinition>,
}

impl TypeDefinitionBuilder {
    pub fn new(type_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn id(mut self, id: PropertyDefinition) -> Result<Self, MappingError> {
        if let Some(existing) = &self.id {
            return Err(MappingError::new(format!(
                "multiple id columns: {} and {}",
                existing.column_name(),
                id.column_name()
            )));
        }
        if id.kind() != ScalarKind::Long {
            return Err(MappingError::new(format!(
                "id column {} must be a 64-bit integer",
                id.column_name()
            )));
        }
        self.ensure_unique_column(&id)?;
        self.id = Some(id);
        Ok(self)
    }

    pub fn version(mut self, version: PropertyDefinition) -> Result<Self, MappingError> {
        if let Some(existing) = &self.version {
            return Err(MappingError::new(format!(
                "multiple version columns: {} and {}",
                existing.column_name(),
                version.column_name()
            )));
        }
        if !matches!(version.kind(), ScalarKind::Int | ScalarKind::Long) {
            return Err(MappingError::new(format!(
                "version column {} must be an integer",
                version.column_name()
            )));
        }
        self.ensure_unique_column(&version)?;
        self.version = Some(version);
        Ok(self)
    }

    pub fn property(mut self, property: PropertyDefinition) -> Result<Self, MappingError> {
        self.ensure_unique_column(&property)?;
        self.properties.push(property);
        Ok(self)
    }

    pub fn constraint(mut self, constraint: ConstraintDefinition) -> Result<Self, MappingError> {
        if let Some(existing) = self.constraints.iter().find(|c| c.same_as(&constraint)) {
            return Err(MappingError::new(format!(
                "duplicate {} constraint {}",
                existing.kind(),
                existing.name().unwrap_or_default()
            )));
        }
        self.constraints.push(constraint);
        Ok(self)
    }

    pub fn index(mut self, index: IndexDefinition) -> Result<Self, MappingError> {
        if self.indexes.iter().any(|i| i.same_as(&index)) {
            return Err(MappingError::new(format!("duplicate index {}", index.name())));
        }
        self.indexes.push(index);
        Ok(self)
    }

    pub fn trigger(mut self, trigger: TriggerDefinition) -> Result<Self, MappingError> {
        if self.triggers.iter().any(|t| t.same_as(&trigger)) {
            return Err(MappingError::new(format!("duplicate trigger {}", trigger.name())));
        }
        self.triggers.push(trigger);
        Ok(self)
    }

    /// Map the leading identifier of a column list entry to its column name.
    ///
    /// A field name wins over a column name; anything that matches neither
    /// is kept as written and rejected by [`Self::build`].
    pub fn resolve_column(&self, entry: &str) -> String {
        let entry = entry.trim();
        let leading = naming::leading_identifier(entry);
        let rest = &entry[leading.len()..];
        let mut known = self.id.iter().chain(self.version.iter()).chain(self.properties.iter());
        let by_field = known.clone().find(|p| p.field_name() == leading);
        match by_field.or_else(|| known.find(|p| p.column_name().eq_ignore_ascii_case(leading))) {
            Some(property) => format!("{}{}", property.column_name(), rest),
            None => entry.to_string(),
        }
    }

    fn ensure_unique_column(&self, candidate: &PropertyDefinition) -> Result<(), MappingError> {
        let taken = self
            .id
            .iter()
            .chain(self.version.iter())
            .chain(self.properties.iter())
            .any(|p| p.column_name().eq_ignore_ascii_case(candidate.column_name()));
        if taken {
            return Err(MappingError::new(format!(
                "duplicate column {}",
                candidate.column_name()
            )));
        }
        Ok(())
    }

    pub fn build(self) -> Result<TypeDefinition, MappingError> {
        if self.type_name.trim().is_empty() {
            return Err(MappingError::new("type name must not be empty"));
        }
        naming::validate_identifier("table", &self.table_name)?;
        let id = self
            .id
            .ok_or_else(|| MappingError::new(format!("type {} has no id column", self.type_name)))?;

        let has_column = |name: &str| {
            std::iter::once(&id)
                .chain(self.version.iter())
                .chain(self.properties.iter())
                .any(|p| p.column_name().eq_ignore_ascii_case(name))
        };
        for constraint in self.constraints.iter().filter(|c| c.scope() == ConstraintScope::Table) {
            if let Some(missing) = constraint
                .columns()
                .iter()
                .map(|c| naming::leading_identifier(c))
                .find(|c| !has_column(c))
            {
                return Err(MappingError::new(format!(
                    "constraint {} names unknown column {}",
                    constraint.name().unwrap_or_default(),
                    missing
                )));
            }
        }
        for index in &self.indexes {
            if let Some(missing) = index
                .columns()
                .iter()
                .map(|c| naming::leading_identifier(c))
                .find(|c| !has_column(c))
            {
                return Err(MappingError::new(format!(
                    "index {} names unknown column {}",
                    index.name(),
                    missing
                )));
            }
        }

        let mut columns = vec![id.statement().to_string()];
        columns.extend(self.properties.iter().map(|p| p.statement().to_string()));
        if let Some(version) = &self.version {
            columns.push(version.statement().to_string());
        }
        columns.extend(self.constraints.iter().map(|c| c.statement().to_string()));

        let mut create = StatementBuilder::new();
        create.word("CREATE");
        if self.temporary {
            create.word("TEMPORARY");
        }
        create.word("TABLE").word(&self.table_name).list(&columns);

        let dml = render_dml(&self.table_name, &id, self.version.as_ref(), &self.properties);

        Ok(TypeDefinition {
            type_name: self.type_name,
            table_name: self.table_name,
            temporary: self.temporary,
            id,
            version: self.version,
            properties: self.properties,
            constraints: self.constraints,
            indexes: self.indexes,
            triggers: self.triggers,
            create_table: create.build(),
            dml,
        })
    }
}

fn render_dml(
    table: &str,
    id: &PropertyDefinition,
    version: Option<&PropertyDefinition>,
    properties: &[PropertyDefinition],
) -> DmlStatements {
    let insert_columns: Vec<&str> = properties
        .iter()
        .filter(|p| p.is_bindable() && p.is_insertable())
        .map(|p| p.column_name())
        .collect();
    let update_columns: Vec<&str> = properties
        .iter()
        .filter(|p| p.is_bindable() && p.is_updatable())
        .map(|p| p.column_name())
        .collect();
    let version_column = version.map(|v| v.column_name());

    let update = if update_columns.is_empty() && version_column.is_none() {
        None
    } else {
        Some(sql::build_update(table, &update_columns, id.column_name(), version_column))
    };

    let mut select_columns = vec![id.column_name()];
    select_columns.extend(properties.iter().map(|p| p.column_name()));
    select_columns.extend(version_column);
    let id_predicate = format!("{}=?", sql::quote_identifier(id.column_name()));
    let select_by_id = sql::build_select(
        table,
        &select_columns,
        &SelectClauses {
            selection: Some(&id_predicate),
            ..Default::default()
        },
    );

    DmlStatements {
        insert: sql::build_insert(table, &insert_columns, version_column),
        update,
        delete: sql::build_delete(table, id.column_name(), None),
        select_by_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::constraint::ConstraintBuilder;
    use crate::schema::index::IndexBuilder;
    use crate::schema::property::PropertyBuilder;
    use crate::schema::types::{ConflictPolicy, ConstraintKind};

    fn id_column() -> PropertyDefinition {
        PropertyBuilder::new("id", "_ID", ScalarKind::Long)
            .unbound()
            .constraint(
                ConstraintBuilder::column(ConstraintKind::PrimaryKey)
                    .conflict(ConflictPolicy::Rollback)
                    .autoincrement(true)
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .build()
            .unwrap()
    }

    fn version_column() -> PropertyDefinition {
        PropertyBuilder::new("version", "_VERSION", ScalarKind::Long)
            .unbound()
            .build()
            .unwrap()
    }

    fn column(field: &str, column: &str, kind: ScalarKind) -> PropertyDefinition {
        PropertyBuilder::new(field, column, kind).build().unwrap()
    }

    #[test]
    fn test_builds_create_table_and_dml() {
        let definition = TypeDefinitionBuilder::new("Person", "PERSON")
            .id(id_column())
            .unwrap()
            .property(column("name", "NAME", ScalarKind::String))
            .unwrap()
            .property(column("age", "AGE", ScalarKind::Int))
            .unwrap()
            .version(version_column())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            definition.create_table(),
            "CREATE TABLE PERSON (_ID INTEGER PRIMARY KEY ON CONFLICT ROLLBACK AUTOINCREMENT, \
             NAME TEXT, AGE INTEGER, _VERSION INTEGER)"
        );
        let dml = definition.dml();
        assert_eq!(dml.insert, "INSERT INTO PERSON ('NAME','AGE','_VERSION') VALUES (?,?,0)");
        assert_eq!(
            dml.update.as_deref(),
            Some("UPDATE PERSON SET 'NAME'=?,'AGE'=?,_VERSION=_VERSION + 1 WHERE _ID=? AND _VERSION=?")
        );
        assert_eq!(dml.delete, "DELETE FROM PERSON WHERE _ID=?");
        assert_eq!(
            dml.select_by_id,
            "SELECT \"_ID\",\"NAME\",\"AGE\",\"_VERSION\" FROM PERSON WHERE \"_ID\"=?"
        );
        assert_eq!(definition.query_columns(), vec!["_ID", "NAME", "AGE", "_VERSION"]);
    }

    #[test]
    fn test_requires_id() {
        let result = TypeDefinitionBuilder::new("Person", "PERSON")
            .property(column("name", "NAME", ScalarKind::String))
            .unwrap()
            .build();
        assert!(result.unwrap_err().message.contains("no id column"));
    }

    #[test]
    fn test_rejects_duplicate_columns() {
        let builder = TypeDefinitionBuilder::new("Person", "PERSON")
            .id(id_column())
            .unwrap()
            .property(column("name", "NAME", ScalarKind::String))
            .unwrap();
        assert!(builder.clone().property(column("other", "name", ScalarKind::String)).is_err());
        assert!(builder.clone().property(column("id2", "_id", ScalarKind::Long)).is_err());
        assert!(builder.id(id_column()).is_err());
    }

    #[test]
    fn test_rejects_unknown_index_column() {
        let result = TypeDefinitionBuilder::new("Person", "PERSON")
            .id(id_column())
            .unwrap()
            .index(IndexBuilder::new("PERSON").columns(["MISSING"]).build().unwrap())
            .unwrap()
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_unique_column() {
        let unique = ConstraintBuilder::table(ConstraintKind::Unique, "name")
            .columns(["MISSING"])
            .build()
            .unwrap();
        let error = TypeDefinitionBuilder::new("Person", "PERSON")
            .id(id_column())
            .unwrap()
            .property(column("name", "FULL_NAME", ScalarKind::String))
            .unwrap()
            .constraint(unique)
            .unwrap()
            .build()
            .unwrap_err();
        assert!(error.message.contains("unknown column MISSING"), "{}", error.message);
    }

    #[test]
    fn test_resolve_column_prefers_field_names() {
        let builder = TypeDefinitionBuilder::new("Person", "PERSON")
            .id(id_column())
            .unwrap()
            .property(column("name", "FULL_NAME", ScalarKind::String))
            .unwrap()
            .property(column("nick", "NAME", ScalarKind::String))
            .unwrap();
        assert_eq!(builder.resolve_column("name"), "FULL_NAME");
        assert_eq!(builder.resolve_column("name DESC"), "FULL_NAME DESC");
        assert_eq!(builder.resolve_column("full_name"), "FULL_NAME");
        assert_eq!(builder.resolve_column("id"), "_ID");
        assert_eq!(builder.resolve_column("ghost"), "ghost");
    }

    #[test]
    fn test_no_update_without_updatable_columns() {
        let definition = TypeDefinitionBuilder::new("Tag", "TAG")
            .id(id_column())
            .unwrap()
            .property(
                PropertyBuilder::new("label", "LABEL", ScalarKind::String)
                    .updatable(false)
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .build()
            .unwrap();
        assert!(definition.dml().update.is_none());
        assert_eq!(definition.dml().insert, "INSERT INTO TAG ('LABEL') VALUES (?)");
    }

    #[test]
    fn test_ddl_and_fingerprint() {
        let build = || {
            TypeDefinitionBuilder::new("Person", "PERSON")
                .id(id_column())
                .unwrap()
                .property(column("name", "NAME", ScalarKind::String))
                .unwrap()
                .index(IndexBuilder::new("PERSON").columns(["NAME"]).build().unwrap())
                .unwrap()
                .build()
                .unwrap()
        };
        let definition = build();
        let ddl = definition.ddl();
        assert_eq!(ddl.lines().count(), 2);
        assert!(ddl.ends_with("CREATE INDEX IDX_PERSON_NAME ON PERSON (NAME);"));
        assert_eq!(definition.fingerprint(), build().fingerprint());
        assert_eq!(definition.fingerprint().len(), 64);
    }
}
