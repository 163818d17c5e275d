//! Schema vocabulary - storage kinds, constraint kinds and SQL keywords
//!
//! Every enum here renders to the exact SQL keyword it stands for, and
//! deserializes from the same upper-case spelling in declaration files.

use crate::schema::MappingError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a persisted field is stored and converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    /// Date stored as epoch milliseconds
    DateLong,
    /// Date stored as formatted text
    DateString,
}

impl ScalarKind {
    /// Storage class keyword rendered in the column definition.
    ///
    /// Byte arrays carry no declared type.
    pub fn storage_class(&self) -> &'static str {
        match self {
            ScalarKind::Bool | ScalarKind::DateLong => "NUMERIC",
            ScalarKind::Char | ScalarKind::String | ScalarKind::DateString => "TEXT",
            ScalarKind::Byte | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long => "INTEGER",
            ScalarKind::Float | ScalarKind::Double => "REAL",
            ScalarKind::Bytes => "",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::Byte => "byte",
            ScalarKind::Short => "short",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::String => "string",
            ScalarKind::Bytes => "bytes",
            ScalarKind::DateLong => "date_long",
            ScalarKind::DateString => "date_string",
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, ScalarKind::DateLong | ScalarKind::DateString)
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field type shape as written in a declaration.
///
/// Shapes are Rust type spellings (`i64`, `Option<String>`, `DateTime<Utc>`).
/// Anything else is taken to name another entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Scalar { kind: ScalarKind, nullable: bool },
    Date { nullable: bool },
    Entity { name: String, nullable: bool },
}

impl TypeShape {
    pub fn parse(shape: &str) -> Result<Self, MappingError> {
        let compact: String = shape.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(MappingError::new("field type must not be empty"));
        }

        let (inner, nullable) = match compact
            .strip_prefix("Option<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            Some(inner) => (inner, true),
            None => (compact.as_str(), false),
        };

        let kind = match inner {
            "bool" => ScalarKind::Bool,
            "char" => ScalarKind::Char,
            "i8" => ScalarKind::Byte,
            "i16" => ScalarKind::Short,
            "i32" => ScalarKind::Int,
            "i64" => ScalarKind::Long,
            "f32" => ScalarKind::Float,
            "f64" => ScalarKind::Double,
            "String" => ScalarKind::String,
            "Vec<u8>" => ScalarKind::Bytes,
            "DateTime" | "DateTime<Utc>" => return Ok(TypeShape::Date { nullable }),
            other if other.contains(['<', '>', ',', '&', '[']) => {
                return Err(MappingError::new(format!("unsupported field type '{}'", shape)));
            }
            other => {
                return Ok(TypeShape::Entity {
                    name: other.to_string(),
                    nullable,
                });
            }
        };
        Ok(TypeShape::Scalar { kind, nullable })
    }
}

/// Conflict resolution clause (`ON CONFLICT ...`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictPolicy {
    #[default]
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Rollback => "ROLLBACK",
            ConflictPolicy::Abort => "ABORT",
            ConflictPolicy::Fail => "FAIL",
            ConflictPolicy::Ignore => "IGNORE",
            ConflictPolicy::Replace => "REPLACE",
        }
    }

    pub fn clause(&self) -> String {
        format!("ON CONFLICT {}", self.as_str())
    }
}

/// Sort hint for primary keys and query ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Foreign key action for `ON UPDATE` / `ON DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceAction {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl ReferenceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceAction::NoAction => "NO ACTION",
            ReferenceAction::Restrict => "RESTRICT",
            ReferenceAction::SetNull => "SET NULL",
            ReferenceAction::SetDefault => "SET DEFAULT",
            ReferenceAction::Cascade => "CASCADE",
        }
    }
}

/// Trigger timing and event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerEvent {
    Delete,
    Insert,
    Update,
    BeforeDelete,
    BeforeInsert,
    BeforeUpdate,
    AfterDelete,
    AfterInsert,
    AfterUpdate,
    InsteadOfDelete,
    InsteadOfInsert,
    InsteadOfUpdate,
}

impl TriggerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerEvent::Delete => "DELETE",
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::BeforeDelete => "BEFORE DELETE",
            TriggerEvent::BeforeInsert => "BEFORE INSERT",
            TriggerEvent::BeforeUpdate => "BEFORE UPDATE",
            TriggerEvent::AfterDelete => "AFTER DELETE",
            TriggerEvent::AfterInsert => "AFTER INSERT",
            TriggerEvent::AfterUpdate => "AFTER UPDATE",
            TriggerEvent::InsteadOfDelete => "INSTEAD OF DELETE",
            TriggerEvent::InsteadOfInsert => "INSTEAD OF INSERT",
            TriggerEvent::InsteadOfUpdate => "INSTEAD OF UPDATE",
        }
    }
}

/// Whether a constraint is rendered inline in a column or after the columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintScope {
    Table,
    Column,
}

/// Constraint kinds known to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    Default,
    Collate,
    Unique,
    NotNull,
    Check,
    References,
}

impl ConstraintKind {
    /// SQL keyword(s) introducing the constraint
    pub fn keyword(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::Default => "DEFAULT",
            ConstraintKind::Collate => "COLLATE",
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::NotNull => "NOT NULL",
            ConstraintKind::Check => "CHECK",
            ConstraintKind::References => "REFERENCES",
        }
    }

    /// Prefix prepended to named (table scope) constraints
    pub fn prefix(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PK_",
            ConstraintKind::Default => "DEF_",
            ConstraintKind::Collate => "COL_",
            ConstraintKind::Unique => "UNI_",
            ConstraintKind::NotNull => "NNL_",
            ConstraintKind::Check => "CHK_",
            ConstraintKind::References => "REF_",
        }
    }

    /// Only these kinds may appear after the column list.
    pub fn allowed_for_table(&self) -> bool {
        matches!(
            self,
            ConstraintKind::PrimaryKey | ConstraintKind::Unique | ConstraintKind::Check
        )
    }

    pub fn all() -> &'static [ConstraintKind] {
        &[
            ConstraintKind::PrimaryKey,
            ConstraintKind::Default,
            ConstraintKind::Collate,
            ConstraintKind::Unique,
            ConstraintKind::NotNull,
            ConstraintKind::Check,
            ConstraintKind::References,
        ]
    }
}

impl FromStr for ConstraintKind {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace([' ', '-'], "_").as_str() {
            "PRIMARY_KEY" | "PK" => Ok(ConstraintKind::PrimaryKey),
            "DEFAULT" => Ok(ConstraintKind::Default),
            "COLLATE" => Ok(ConstraintKind::Collate),
            "UNIQUE" => Ok(ConstraintKind::Unique),
            "NOT_NULL" => Ok(ConstraintKind::NotNull),
            "CHECK" => Ok(ConstraintKind::Check),
            "REFERENCES" => Ok(ConstraintKind::References),
            _ => Err(MappingError::new(format!("unknown constraint kind: {}", s))),
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}
