//! Entity declarations - the compiler's input
//!
//! Declarations describe an entity type's persisted fields and table-level
//! metadata. They can be written in Rust with the fluent constructors below
//! or deserialized from TOML schema files:
//!
//! ```toml
//! [[entity]]
//! name = "Person"
//! table = { name = "people" }
//!
//! [[entity.field]]
//! name = "id"
//! type = "i64"
//! id = {}
//!
//! [[entity.field]]
//! name = "name"
//! type = "String"
//! column = { not_null = true, indexed = true }
//! ```

use crate::schema::types::{ConflictPolicy, ReferenceAction, SortOrder, TriggerEvent};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Declaration of one entity type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDeclaration {
    /// Type name, used as table name unless overridden
    pub name: String,
    #[serde(default)]
    pub table: TableDeclaration,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldDeclaration>,
}

impl EntityDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table.name = Some(name.into());
        self
    }

    pub fn temporary(mut self) -> Self {
        self.table.temporary = true;
        self
    }

    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    pub fn unique(mut self, unique: UniqueDeclaration) -> Self {
        self.table.uniques.push(unique);
        self
    }

    pub fn check(mut self, check: CheckDeclaration) -> Self {
        self.table.checks.push(check);
        self
    }

    pub fn index(mut self, index: IndexDeclaration) -> Self {
        self.table.indexes.push(index);
        self
    }

    pub fn trigger(mut self, trigger: TriggerDeclaration) -> Self {
        self.table.triggers.push(trigger);
        self
    }
}

/// Table-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub temporary: bool,
    #[serde(default, rename = "unique")]
    pub uniques: Vec<UniqueDeclaration>,
    #[serde(default, rename = "check")]
    pub checks: Vec<CheckDeclaration>,
    #[serde(default, rename = "index")]
    pub indexes: Vec<IndexDeclaration>,
    #[serde(default, rename = "trigger")]
    pub triggers: Vec<TriggerDeclaration>,
}

/// One field of an entity.
///
/// A field is persisted when it carries an id, version, column or reference
/// declaration. Other fields are ignored by the compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    /// Rust type spelling, e.g. `i64`, `Option<String>` or another entity name
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub id: Option<IdDeclaration>,
    #[serde(default)]
    pub version: Option<VersionDeclaration>,
    #[serde(default)]
    pub column: Option<ColumnDeclaration>,
    #[serde(default)]
    pub unique: Option<UniqueDeclaration>,
    #[serde(default)]
    pub not_null: Option<NotNullDeclaration>,
    #[serde(default)]
    pub check: Option<CheckDeclaration>,
    #[serde(default)]
    pub index: Option<IndexDeclaration>,
    #[serde(default)]
    pub reference: Option<ReferenceDeclaration>,
}

impl FieldDeclaration {
    fn named(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            ..Self::default()
        }
    }

    /// `i64` id field with default settings.
    pub fn id(name: impl Into<String>) -> Self {
        Self {
            id: Some(IdDeclaration::default()),
            ..Self::named(name, "i64")
        }
    }

    /// `i64` version field with default settings.
    pub fn version(name: impl Into<String>) -> Self {
        Self {
            version: Some(VersionDeclaration::default()),
            ..Self::named(name, "i64")
        }
    }

    /// Plain persisted column.
    pub fn column(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            column: Some(ColumnDeclaration::default()),
            ..Self::named(name, ty)
        }
    }

    /// Field declared without any persistence metadata.
    pub fn transient(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::named(name, ty)
    }

    /// Replace the column settings.
    pub fn with_column(mut self, column: ColumnDeclaration) -> Self {
        self.column = Some(column);
        self
    }

    /// Replace the id settings.
    pub fn with_id(mut self, id: IdDeclaration) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_version(mut self, version: VersionDeclaration) -> Self {
        self.version = Some(version);
        self
    }

    pub fn unique(mut self, unique: UniqueDeclaration) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn not_null(mut self, not_null: NotNullDeclaration) -> Self {
        self.not_null = Some(not_null);
        self
    }

    pub fn check(mut self, check: CheckDeclaration) -> Self {
        self.check = Some(check);
        self
    }

    pub fn index(mut self, index: IndexDeclaration) -> Self {
        self.index = Some(index);
        self
    }

    pub fn reference(mut self, reference: ReferenceDeclaration) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some() || self.version.is_some() || self.column.is_some() || self.reference.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    #[serde(default = "default_true")]
    pub autoincrement: bool,
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

impl Default for IdDeclaration {
    fn default() -> Self {
        Self {
            name: None,
            sort: None,
            autoincrement: true,
            on_conflict: ConflictPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionDeclaration {
    #[serde(default)]
    pub name: Option<String>,
}

/// Storage representation of a date field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRepresentation {
    /// Epoch milliseconds
    #[default]
    Long,
    /// Formatted text
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub collate: Option<String>,
    #[serde(default)]
    pub check: Option<String>,
    #[serde(default)]
    pub date: DateRepresentation,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default = "default_true")]
    pub insertable: bool,
    #[serde(default = "default_true")]
    pub updatable: bool,
}

impl Default for ColumnDeclaration {
    fn default() -> Self {
        Self {
            name: None,
            not_null: false,
            unique: false,
            indexed: false,
            default: None,
            collate: None,
            check: None,
            date: DateRepresentation::default(),
            date_format: None,
            insertable: true,
            updatable: true,
        }
    }
}

impl ColumnDeclaration {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn default_value(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(expression.into());
        self
    }

    pub fn collate(mut self, collation: impl Into<String>) -> Self {
        self.collate = Some(collation.into());
        self
    }

    pub fn check(mut self, expression: impl Into<String>) -> Self {
        self.check = Some(expression.into());
        self
    }

    /// Store a date field as text, optionally with a custom format.
    pub fn date_as_string(mut self, format: Option<&str>) -> Self {
        self.date = DateRepresentation::String;
        self.date_format = format.map(str::to_string);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.updatable = false;
        self
    }

    pub fn insertable(mut self, insertable: bool) -> Self {
        self.insertable = insertable;
        self
    }
}

/// Unique constraint. At field level the columns are ignored; at table level
/// name and columns are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniqueDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

impl UniqueDeclaration {
    pub fn table<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            columns: columns.into_iter().map(Into::into).collect(),
            on_conflict: ConflictPolicy::default(),
        }
    }

    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotNullDeclaration {
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    pub expression: String,
}

impl CheckDeclaration {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            name: None,
            expression: expression.into(),
        }
    }

    pub fn named(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            expression: expression.into(),
        }
    }
}

/// Index declaration. At field level the columns are the field's column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
}

impl IndexDeclaration {
    pub fn on<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn where_clause(mut self, predicate: impl Into<String>) -> Self {
        self.where_clause = Some(predicate.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDeclaration {
    pub name: String,
    #[serde(default)]
    pub temporary: bool,
    pub event: TriggerEvent,
    #[serde(default)]
    pub for_each_row: bool,
    #[serde(default)]
    pub when: Option<String>,
    pub statements: Vec<String>,
}

impl TriggerDeclaration {
    pub fn new<I, S>(name: impl Into<String>, event: TriggerEvent, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            temporary: false,
            event,
            for_each_row: false,
            when: None,
            statements: statements.into_iter().map(Into::into).collect(),
        }
    }

    pub fn for_each_row(mut self) -> Self {
        self.for_each_row = true;
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.when = Some(condition.into());
        self
    }
}

/// Foreign key to another entity type's id column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDeclaration {
    /// Referenced entity type name
    pub entity: String,
    #[serde(default)]
    pub on_update: Option<ReferenceAction>,
    #[serde(default)]
    pub on_delete: Option<ReferenceAction>,
}

impl ReferenceDeclaration {
    pub fn to(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    pub fn on_delete(mut self, action: ReferenceAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferenceAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// Top-level layout of a schema file: a list of `[[entity]]` tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityDeclaration>,
}

impl SchemaFile {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema_file() {
        let file = SchemaFile::parse(
            r#"
            [[entity]]
            name = "Person"
            table = { name = "people", check = [{ name = "adult", expression = "AGE >= 18" }] }

            [[entity.field]]
            name = "id"
            type = "i64"
            id = { sort = "DESC" }

            [[entity.field]]
            name = "name"
            type = "String"
            column = { not_null = true, indexed = true }

            [[entity.field]]
            name = "born"
            type = "Option<DateTime<Utc>>"
            column = { date = "string" }

            [[entity.field]]
            name = "cached"
            type = "String"
            "#,
        )
        .unwrap();

        assert_eq!(file.entities.len(), 1);
        let person = &file.entities[0];
        assert_eq!(person.table.name.as_deref(), Some("people"));
        assert_eq!(person.table.checks[0].name.as_deref(), Some("adult"));
        assert_eq!(person.fields.len(), 4);

        let id = person.fields[0].id.as_ref().unwrap();
        assert_eq!(id.sort, Some(SortOrder::Desc));
        assert!(id.autoincrement);
        assert_eq!(id.on_conflict, ConflictPolicy::Rollback);

        let name = person.fields[1].column.as_ref().unwrap();
        assert!(name.not_null && name.indexed && name.updatable);

        let born = person.fields[2].column.as_ref().unwrap();
        assert_eq!(born.date, DateRepresentation::String);
        assert!(born.date_format.is_none());

        assert!(!person.fields[3].is_persisted());
    }

    #[test]
    fn test_fluent_matches_parsed() {
        let fluent = EntityDeclaration::new("Tag")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("label", "String"));
        let parsed = SchemaFile::parse(
            r#"
            [[entity]]
            name = "Tag"
            [[entity.field]]
            name = "id"
            type = "i64"
            id = {}
            [[entity.field]]
            name = "label"
            type = "String"
            column = {}
            "#,
        )
        .unwrap();
        assert_eq!(parsed.entities[0], fluent);
    }
}
