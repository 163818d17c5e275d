//! Naming rules for tables, columns, constraints, indexes and triggers.

use crate::schema::MappingError;
use crate::schema::types::ConstraintKind;
use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_ID_COLUMN: &str = "_ID";
pub const DEFAULT_VERSION_COLUMN: &str = "_VERSION";
pub const TRIGGER_PREFIX: &str = "TRI_";
pub const INDEX_PREFIX: &str = "IDX_";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Check that `name` is a plain SQL identifier.
pub fn validate_identifier(what: &str, name: &str) -> Result<(), MappingError> {
    if name.trim().is_empty() {
        return Err(MappingError::new(format!("{} name must not be empty", what)));
    }
    if !IDENTIFIER.is_match(name) {
        return Err(MappingError::new(format!(
            "{} name '{}' is not a valid identifier",
            what, name
        )));
    }
    Ok(())
}

/// Table name: the upper-cased override if given, else the type name.
pub fn table_name(type_name: &str, explicit: Option<&str>) -> Result<String, MappingError> {
    let name = match explicit.filter(|n| !n.trim().is_empty()) {
        Some(name) => name.trim().to_uppercase(),
        None => type_name.to_string(),
    };
    validate_identifier("table", &name)?;
    Ok(name)
}

/// Column name: the upper-cased override if given, else the upper-cased field name.
pub fn column_name(field_name: &str, explicit: Option<&str>) -> Result<String, MappingError> {
    let name = explicit
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(field_name)
        .trim()
        .to_uppercase();
    validate_identifier("column", &name)?;
    Ok(name)
}

/// Name for a table scope constraint, e.g. `UNI_EMAIL`.
pub fn constraint_name(kind: ConstraintKind, logical: &str) -> Result<String, MappingError> {
    let logical = logical.trim().to_uppercase();
    validate_identifier("constraint", &logical)?;
    let prefix = kind.prefix();
    if logical.starts_with(prefix) {
        Ok(logical)
    } else {
        Ok(format!("{}{}", prefix, logical))
    }
}

/// Index name: the explicit name, else `IDX_<TABLE>_<C1>_<C2>...`.
pub fn index_name(
    table: &str,
    explicit: Option<&str>,
    columns: &[String],
) -> Result<String, MappingError> {
    let name = match explicit.filter(|n| !n.trim().is_empty()) {
        Some(name) => name.trim().to_uppercase(),
        None => {
            let mut name = format!("{}{}", INDEX_PREFIX, table.to_uppercase());
            for column in columns {
                name.push('_');
                name.push_str(&leading_identifier(column).to_uppercase());
            }
            name
        }
    };
    validate_identifier("index", &name)?;
    Ok(name)
}

/// Trigger name: `TRI_<NAME>`.
pub fn trigger_name(logical: &str) -> Result<String, MappingError> {
    let logical = logical.trim().to_uppercase();
    validate_identifier("trigger", &logical)?;
    if logical.starts_with(TRIGGER_PREFIX) {
        Ok(logical)
    } else {
        Ok(format!("{}{}", TRIGGER_PREFIX, logical))
    }
}

/// First word of an indexed-column entry (`NAME COLLATE NOCASE` -> `NAME`).
pub fn leading_identifier(entry: &str) -> &str {
    entry.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("Person", None).unwrap(), "Person");
        assert_eq!(table_name("Person", Some("people")).unwrap(), "PEOPLE");
        assert_eq!(table_name("Person", Some("  ")).unwrap(), "Person");
        assert!(table_name("Person", Some("drop table")).is_err());
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name("firstName", None).unwrap(), "FIRSTNAME");
        assert_eq!(column_name("firstName", Some("first_name")).unwrap(), "FIRST_NAME");
        assert!(column_name("1st", None).is_err());
    }

    #[test]
    fn test_constraint_names() {
        assert_eq!(constraint_name(ConstraintKind::Unique, "email").unwrap(), "UNI_EMAIL");
        assert_eq!(constraint_name(ConstraintKind::Check, "CHK_AGE").unwrap(), "CHK_AGE");
        assert!(constraint_name(ConstraintKind::Unique, "").is_err());
    }

    #[test]
    fn test_index_name() {
        let columns = vec!["NAME COLLATE NOCASE".to_string(), "AGE".to_string()];
        assert_eq!(index_name("PERSON", None, &columns).unwrap(), "IDX_PERSON_NAME_AGE");
        assert_eq!(index_name("PERSON", Some("by_age"), &columns).unwrap(), "BY_AGE");
    }

    #[test]
    fn test_trigger_name() {
        assert_eq!(trigger_name("audit").unwrap(), "TRI_AUDIT");
        assert_eq!(trigger_name("TRI_AUDIT").unwrap(), "TRI_AUDIT");
    }
}
