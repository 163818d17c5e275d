use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

/// One line of the `check` report.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct EntityRow {
    #[tabled(rename = "Entity")]
    pub entity: String,
    #[tabled(rename = "Table")]
    pub table: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

impl EntityRow {
    pub fn ok(entity: &str, table: &str, columns: usize) -> Self {
        Self {
            entity: entity.to_string(),
            table: table.to_string(),
            status: "ok".to_string(),
            detail: format!("{} column(s)", columns),
        }
    }

    pub fn failed(entity: &str, message: &str) -> Self {
        Self {
            entity: entity.to_string(),
            table: "-".to_string(),
            status: "error".to_string(),
            detail: message.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

pub fn entity_table(rows: &[EntityRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_table_lists_rows() {
        let rows = vec![
            EntityRow::ok("Person", "PEOPLE", 3),
            EntityRow::failed("Pet", "Pet: table has no id"),
        ];
        let rendered = entity_table(&rows);
        assert!(rendered.contains("PEOPLE"));
        assert!(rendered.contains("table has no id"));
        assert!(rows[0].is_ok());
        assert!(!rows[1].is_ok());
        assert!(entity_table(&[]).is_empty());
    }
}
