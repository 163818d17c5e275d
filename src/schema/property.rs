//! Property (column) definitions.

use crate::schema::MappingError;
use crate::schema::constraint::ConstraintDefinition;
use crate::schema::naming;
use crate::schema::types::{ConstraintKind, ConstraintScope, ScalarKind};
use crate::sql::StatementBuilder;

/// Default textual date format: ISO-8601 with milliseconds and offset.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// One persisted field of an entity type.
#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    field_name: String,
    column_name: String,
    kind: ScalarKind,
    date_format: Option<String>,
    insertable: bool,
    updatable: bool,
    bindable: bool,
    constraints: Vec<ConstraintDefinition>,
    statement: String,
}

impl PropertyDefinition {
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Format used when the kind is [`ScalarKind::DateString`]
    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    pub fn is_insertable(&self) -> bool {
        self.insertable
    }

    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    /// False for columns whose value is maintained by the statement itself.
    pub fn is_bindable(&self) -> bool {
        self.bindable
    }

    pub fn constraints(&self) -> &[ConstraintDefinition] {
        &self.constraints
    }

    pub fn has_constraint(&self, kind: ConstraintKind) -> bool {
        self.constraints.iter().any(|c| c.kind() == kind)
    }

    /// Column definition as rendered inside `CREATE TABLE`
    pub fn statement(&self) -> &str {
        &self.statement
    }
}

/// Builder for [`PropertyDefinition`].
#[derive(Debug, Clone)]
pub struct PropertyBuilder {
    field_name: String,
    column_name: String,
    kind: ScalarKind,
    date_format: Option<String>,
    insertable: bool,
    updatable: bool,
    bindable: bool,
    constraints: Vec<ConstraintDefinition>,
}

impl PropertyBuilder {
    pub fn new(field_name: impl Into<String>, column_name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            field_name: field_name.into(),
            column_name: column_name.into(),
            kind,
            date_format: None,
            insertable: true,
            updatable: true,
            bindable: true,
            constraints: Vec::new(),
        }
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn insertable(mut self, insertable: bool) -> Self {
        self.insertable = insertable;
        self
    }

    pub fn updatable(mut self, updatable: bool) -> Self {
        self.updatable = updatable;
        self
    }

    /// Mark the column as never bound from entity state.
    pub fn unbound(mut self) -> Self {
        self.bindable = false;
        self.insertable = false;
        self.updatable = false;
        self
    }

    /// Attach an inline constraint. A column carries at most one of each kind.
    pub fn constraint(mut self, constraint: ConstraintDefinition) -> Result<Self, MappingError> {
        if constraint.scope() != ConstraintScope::Column {
            return Err(MappingError::new(format!(
                "{} constraint on column {} must be column scoped",
                constraint.kind(),
                self.column_name
            )));
        }
        if self.constraints.iter().any(|c| c.kind() == constraint.kind()) {
            return Err(MappingError::new(format!(
                "duplicate {} constraint on column {}",
                constraint.kind(),
                self.column_name
            )));
        }
        self.constraints.push(constraint);
        Ok(self)
    }

    pub fn build(self) -> Result<PropertyDefinition, MappingError> {
        if self.field_name.trim().is_empty() {
            return Err(MappingError::new("field name must not be empty"));
        }
        naming::validate_identifier("column", &self.column_name)?;
        if self.kind == ScalarKind::DateString
            && self.date_format.as_deref().is_none_or(|f| f.trim().is_empty())
        {
            return Err(MappingError::new(format!(
                "textual date column {} requires a non-empty format",
                self.column_name
            )));
        }

        let mut sql = StatementBuilder::new();
        sql.word(&self.column_name).word(self.kind.storage_class());
        for constraint in &self.constraints {
            sql.word(constraint.statement());
        }

        Ok(PropertyDefinition {
            field_name: self.field_name,
            column_name: self.column_name,
            kind: self.kind,
            date_format: self.date_format,
            insertable: self.insertable,
            updatable: self.updatable,
            bindable: self.bindable,
            constraints: self.constraints,
            statement: sql.build(),
        })
    }
}
