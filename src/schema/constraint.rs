//! Constraint definitions
//!
//! A constraint is either inline in a column definition or, for the kinds
//! that allow it, a named clause following the column list. The rendered
//! statement is fixed when the definition is built.

use crate::schema::MappingError;
use crate::schema::naming;
use crate::schema::types::{ConflictPolicy, ConstraintKind, ConstraintScope, ReferenceAction, SortOrder};
use crate::sql::StatementBuilder;

/// Target of a `REFERENCES` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTarget {
    pub table: String,
    pub column: String,
    pub on_update: Option<ReferenceAction>,
    pub on_delete: Option<ReferenceAction>,
}

/// A validated, rendered constraint.
#[derive(Debug, Clone)]
pub struct ConstraintDefinition {
    kind: ConstraintKind,
    scope: ConstraintScope,
    name: Option<String>,
    columns: Vec<String>,
    statement: String,
}

impl ConstraintDefinition {
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn scope(&self) -> ConstraintScope {
        self.scope
    }

    /// Full constraint name (table scope only), e.g. `UNI_EMAIL`
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Column list of a table scope constraint
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Table scope constraints are the same when kind and name match.
    pub fn same_as(&self, other: &ConstraintDefinition) -> bool {
        self.kind == other.kind
            && match (&self.name, &other.name) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
    }
}

/// Collects constraint parts and validates them into a [`ConstraintDefinition`].
#[derive(Debug, Clone)]
pub struct ConstraintBuilder {
    kind: ConstraintKind,
    scope: ConstraintScope,
    name: Option<String>,
    columns: Vec<String>,
    conflict: Option<ConflictPolicy>,
    expression: Option<String>,
    sort: Option<SortOrder>,
    autoincrement: bool,
    reference: Option<ReferenceTarget>,
}

impl ConstraintBuilder {
    /// Inline constraint attached to a single column.
    pub fn column(kind: ConstraintKind) -> Self {
        Self {
            kind,
            scope: ConstraintScope::Column,
            name: None,
            columns: Vec::new(),
            conflict: None,
            expression: None,
            sort: None,
            autoincrement: false,
            reference: None,
        }
    }

    /// Named constraint rendered after the column list.
    pub fn table(kind: ConstraintKind, name: impl Into<String>) -> Self {
        Self {
            scope: ConstraintScope::Table,
            name: Some(name.into()),
            ..Self::column(kind)
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn conflict(mut self, policy: ConflictPolicy) -> Self {
        self.conflict = Some(policy);
        self
    }

    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn sort(mut self, sort: Option<SortOrder>) -> Self {
        self.sort = sort;
        self
    }

    pub fn autoincrement(mut self, autoincrement: bool) -> Self {
        self.autoincrement = autoincrement;
        self
    }

    pub fn reference(mut self, target: ReferenceTarget) -> Self {
        self.reference = Some(target);
        self
    }

    pub fn build(self) -> Result<ConstraintDefinition, MappingError> {
        self.validate()?;

        let name = match (&self.scope, &self.name) {
            (ConstraintScope::Table, Some(name)) => Some(naming::constraint_name(self.kind, name)?),
            _ => None,
        };

        let mut sql = StatementBuilder::new();
        if let Some(name) = &name {
            sql.word("CONSTRAINT").word(name);
        }
        sql.word(self.kind.keyword());

        match self.kind {
            ConstraintKind::PrimaryKey => {
                if self.scope == ConstraintScope::Table {
                    sql.list(&self.columns);
                } else if let Some(sort) = self.sort {
                    sql.word(sort.as_str());
                }
                sql.word(&self.conflict.unwrap_or_default().clause());
                if self.autoincrement {
                    sql.word("AUTOINCREMENT");
                }
            }
            ConstraintKind::Unique => {
                if self.scope == ConstraintScope::Table {
                    sql.list(&self.columns);
                }
                sql.word(&self.conflict.unwrap_or_default().clause());
            }
            ConstraintKind::NotNull => {
                sql.word(&self.conflict.unwrap_or_default().clause());
            }
            ConstraintKind::Check => {
                sql.bracketed(self.expression.as_deref().unwrap_or_default());
            }
            ConstraintKind::Default | ConstraintKind::Collate => {
                sql.word(self.expression.as_deref().unwrap_or_default());
            }
            ConstraintKind::References => {
                if let Some(target) = &self.reference {
                    sql.word(&target.table).bracketed(&target.column);
                    if let Some(action) = target.on_delete {
                        sql.word("ON DELETE").word(action.as_str());
                    }
                    if let Some(action) = target.on_update {
                        sql.word("ON UPDATE").word(action.as_str());
                    }
                }
            }
        }

        Ok(ConstraintDefinition {
            kind: self.kind,
            scope: self.scope,
            name,
            statement: sql.build(),
            columns: self.columns,
        })
    }

    fn validate(&self) -> Result<(), MappingError> {
        let kind = self.kind;
        if self.scope == ConstraintScope::Table {
            if !kind.allowed_for_table() {
                return Err(MappingError::new(format!(
                    "{} constraint is not allowed at table scope",
                    kind
                )));
            }
            if self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                return Err(MappingError::new(format!(
                    "table {} constraint requires a name",
                    kind
                )));
            }
        }

        let has_expression = self.expression.as_deref().is_some_and(|e| !e.trim().is_empty());
        match kind {
            ConstraintKind::Check | ConstraintKind::Default | ConstraintKind::Collate
                if !has_expression =>
            {
                return Err(MappingError::new(format!("{} constraint requires an expression", kind)));
            }
            ConstraintKind::PrimaryKey | ConstraintKind::Unique
                if self.scope == ConstraintScope::Table && self.columns.is_empty() =>
            {
                return Err(MappingError::new(format!("table {} constraint requires columns", kind)));
            }
            ConstraintKind::References => {
                let valid = self
                    .reference
                    .as_ref()
                    .is_some_and(|t| !t.table.trim().is_empty() && !t.column.trim().is_empty());
                if !valid {
                    return Err(MappingError::new(
                        "REFERENCES constraint requires a target table and column",
                    ));
                }
            }
            _ => {}
        }

        if self.autoincrement && kind != ConstraintKind::PrimaryKey {
            return Err(MappingError::new("AUTOINCREMENT only applies to a PRIMARY KEY"));
        }
        if self.sort.is_some() && kind != ConstraintKind::PrimaryKey {
            return Err(MappingError::new("sort order only applies to a PRIMARY KEY"));
        }
        for column in &self.columns {
            naming::validate_identifier("column", naming::leading_identifier(column))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_column() {
        let pk = ConstraintBuilder::column(ConstraintKind::PrimaryKey)
            .sort(Some(SortOrder::Asc))
            .conflict(ConflictPolicy::Rollback)
            .autoincrement(true)
            .build()
            .unwrap();
        assert_eq!(pk.statement(), "PRIMARY KEY ASC ON CONFLICT ROLLBACK AUTOINCREMENT");
        assert!(pk.name().is_none());
    }

    #[test]
    fn test_table_unique() {
        let unique = ConstraintBuilder::table(ConstraintKind::Unique, "name_age")
            .columns(["NAME", "AGE"])
            .conflict(ConflictPolicy::Abort)
            .build()
            .unwrap();
        assert_eq!(unique.name(), Some("UNI_NAME_AGE"));
        assert_eq!(
            unique.statement(),
            "CONSTRAINT UNI_NAME_AGE UNIQUE (NAME, AGE) ON CONFLICT ABORT"
        );
    }

    #[test]
    fn test_table_check() {
        let check = ConstraintBuilder::table(ConstraintKind::Check, "adult")
            .expression("AGE >= 18")
            .build()
            .unwrap();
        assert_eq!(check.statement(), "CONSTRAINT CHK_ADULT CHECK (AGE >= 18)");
    }

    #[test]
    fn test_column_kinds() {
        let not_null = ConstraintBuilder::column(ConstraintKind::NotNull).build().unwrap();
        assert_eq!(not_null.statement(), "NOT NULL ON CONFLICT ROLLBACK");

        let default = ConstraintBuilder::column(ConstraintKind::Default)
            .expression("0")
            .build()
            .unwrap();
        assert_eq!(default.statement(), "DEFAULT 0");

        let collate = ConstraintBuilder::column(ConstraintKind::Collate)
            .expression("NOCASE")
            .build()
            .unwrap();
        assert_eq!(collate.statement(), "COLLATE NOCASE");
    }

    #[test]
    fn test_references() {
        let fk = ConstraintBuilder::column(ConstraintKind::References)
            .reference(ReferenceTarget {
                table: "PERSON".to_string(),
                column: "_ID".to_string(),
                on_update: None,
                on_delete: Some(ReferenceAction::Cascade),
            })
            .build()
            .unwrap();
        assert_eq!(fk.statement(), "REFERENCES PERSON (_ID) ON DELETE CASCADE");
    }

    #[test]
    fn test_rejects_invalid() {
        // NOT NULL is column-only
        assert!(ConstraintBuilder::table(ConstraintKind::NotNull, "x").build().is_err());
        // table constraints need a name
        assert!(ConstraintBuilder::table(ConstraintKind::Check, " ").expression("1").build().is_err());
        // CHECK without expression
        assert!(ConstraintBuilder::column(ConstraintKind::Check).build().is_err());
        // UNIQUE at table scope needs columns
        assert!(ConstraintBuilder::table(ConstraintKind::Unique, "u").build().is_err());
        // REFERENCES needs a target
        assert!(ConstraintBuilder::column(ConstraintKind::References).build().is_err());
        // AUTOINCREMENT only on primary keys
        assert!(ConstraintBuilder::column(ConstraintKind::Unique).autoincrement(true).build().is_err());
    }

    #[test]
    fn test_same_as() {
        let a = ConstraintBuilder::table(ConstraintKind::Unique, "email")
            .columns(["EMAIL"])
            .build()
            .unwrap();
        let b = ConstraintBuilder::table(ConstraintKind::Unique, "EMAIL")
            .columns(["OTHER"])
            .build()
            .unwrap();
        let c = ConstraintBuilder::table(ConstraintKind::Check, "email")
            .expression("1")
            .build()
            .unwrap();
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
