//! Trigger definitions.

use crate::schema::MappingError;
use crate::schema::naming;
use crate::schema::types::TriggerEvent;
use crate::sql::StatementBuilder;

#[derive(Debug, Clone)]
pub struct TriggerDefinition {
    name: String,
    table: String,
    statement: String,
}

impl TriggerDefinition {
    /// Full trigger name, e.g. `TRI_AUDIT`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn same_as(&self, other: &TriggerDefinition) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TriggerBuilder {
    name: String,
    table: String,
    temporary: bool,
    event: Option<TriggerEvent>,
    for_each_row: bool,
    when: Option<String>,
    statements: Vec<String>,
}

impl TriggerBuilder {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn event(mut self, event: TriggerEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn for_each_row(mut self, for_each_row: bool) -> Self {
        self.for_each_row = for_each_row;
        self
    }

    pub fn when(mut self, condition: Option<&str>) -> Self {
        self.when = condition.filter(|c| !c.trim().is_empty()).map(str::to_string);
        self
    }

    pub fn statements<I, S>(mut self, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statements = statements.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Result<TriggerDefinition, MappingError> {
        let name = naming::trigger_name(&self.name)?;
        naming::validate_identifier("table", &self.table)?;
        let event = self
            .event
            .ok_or_else(|| MappingError::new(format!("trigger {} requires an event", name)))?;

        let body: Vec<&str> = self
            .statements
            .iter()
            .map(|s| s.trim().trim_end_matches(';').trim())
            .collect();
        if body.is_empty() || body.iter().any(|s| s.is_empty()) {
            return Err(MappingError::new(format!(
                "trigger {} requires non-empty body statements",
                name
            )));
        }

        let mut sql = StatementBuilder::new();
        sql.word("CREATE");
        if self.temporary {
            sql.word("TEMPORARY");
        }
        sql.word("TRIGGER").word(&name).word(event.as_str()).word("ON").word(&self.table);
        if self.for_each_row {
            sql.word("FOR EACH ROW");
        }
        if let Some(condition) = &self.when {
            sql.word("WHEN").bracketed(condition);
        }
        sql.word("BEGIN");
        for statement in body {
            sql.word(&format!("{};", statement));
        }
        sql.word("END");

        Ok(TriggerDefinition {
            name,
            table: self.table,
            statement: sql.build(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_when_clause() {
        let trigger = TriggerBuilder::new("audit", "PERSON")
            .event(TriggerEvent::AfterUpdate)
            .for_each_row(true)
            .when(Some("NEW.AGE > 100"))
            .statements(["UPDATE PERSON SET AGE = 100 WHERE _ID = NEW._ID;"])
            .build()
            .unwrap();
        assert_eq!(trigger.name(), "TRI_AUDIT");
        assert_eq!(
            trigger.statement(),
            "CREATE TRIGGER TRI_AUDIT AFTER UPDATE ON PERSON FOR EACH ROW WHEN (NEW.AGE > 100) \
             BEGIN UPDATE PERSON SET AGE = 100 WHERE _ID = NEW._ID; END"
        );
    }

    #[test]
    fn test_temporary() {
        let trigger = TriggerBuilder::new("t", "SCRATCH")
            .temporary(true)
            .event(TriggerEvent::Delete)
            .statements(["SELECT 1", "SELECT 2"])
            .build()
            .unwrap();
        assert_eq!(
            trigger.statement(),
            "CREATE TEMPORARY TRIGGER TRI_T DELETE ON SCRATCH BEGIN SELECT 1; SELECT 2; END"
        );
    }

    #[test]
    fn test_rejects_incomplete() {
        assert!(TriggerBuilder::new("t", "T").statements(["SELECT 1"]).build().is_err());
        assert!(TriggerBuilder::new("t", "T").event(TriggerEvent::Insert).build().is_err());
        assert!(TriggerBuilder::new("t", "T")
            .event(TriggerEvent::Insert)
            .statements([";"])
            .build()
            .is_err());
        assert!(TriggerBuilder::new("", "T")
            .event(TriggerEvent::Insert)
            .statements(["SELECT 1"])
            .build()
            .is_err());
    }
}
