//! Index definitions.

use crate::schema::MappingError;
use crate::schema::naming;
use crate::sql::StatementBuilder;

#[derive(Debug, Clone)]
pub struct IndexDefinition {
    name: String,
    table: String,
    unique: bool,
    columns: Vec<String>,
    statement: String,
}

impl IndexDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn same_as(&self, other: &IndexDefinition) -> bool {
        self.table.eq_ignore_ascii_case(&other.table) && self.name.eq_ignore_ascii_case(&other.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    name: Option<String>,
    table: String,
    unique: bool,
    columns: Vec<String>,
    where_clause: Option<String>,
}

impl IndexBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Explicit index name. Without one the name is derived from table and columns.
    pub fn name(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_string);
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Partial index predicate.
    pub fn where_clause(mut self, predicate: Option<&str>) -> Self {
        self.where_clause = predicate.filter(|p| !p.trim().is_empty()).map(str::to_string);
        self
    }

    pub fn build(self) -> Result<IndexDefinition, MappingError> {
        naming::validate_identifier("table", &self.table)?;
        if self.columns.is_empty() {
            return Err(MappingError::new("index requires at least one column"));
        }
        for column in &self.columns {
            naming::validate_identifier("index column", naming::leading_identifier(column))?;
        }
        let name = naming::index_name(&self.table, self.name.as_deref(), &self.columns)?;

        let mut sql = StatementBuilder::new();
        sql.word("CREATE");
        if self.unique {
            sql.word("UNIQUE");
        }
        sql.word("INDEX").word(&name).word("ON").word(&self.table).list(&self.columns);
        if let Some(predicate) = &self.where_clause {
            sql.word("WHERE").word(predicate);
        }

        Ok(IndexDefinition {
            name,
            table: self.table,
            unique: self.unique,
            columns: self.columns,
            statement: sql.build(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_name() {
        let index = IndexBuilder::new("PERSON").columns(["NAME"]).build().unwrap();
        assert_eq!(index.name(), "IDX_PERSON_NAME");
        assert_eq!(index.statement(), "CREATE INDEX IDX_PERSON_NAME ON PERSON (NAME)");
    }

    #[test]
    fn test_partial_unique_index() {
        let index = IndexBuilder::new("PERSON")
            .name(Some("active_email"))
            .unique(true)
            .columns(["EMAIL"])
            .where_clause(Some("ACTIVE = 1"))
            .build()
            .unwrap();
        assert_eq!(
            index.statement(),
            "CREATE UNIQUE INDEX ACTIVE_EMAIL ON PERSON (EMAIL) WHERE ACTIVE = 1"
        );
    }

    #[test]
    fn test_requires_columns() {
        assert!(IndexBuilder::new("PERSON").build().is_err());
        assert!(IndexBuilder::new("").columns(["A"]).build().is_err());
    }
}
