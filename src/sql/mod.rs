//! Statement text builders
//!
//! Pure string-building helpers producing the parameterized DML used by the
//! persistence engine and the word-oriented builder used to render DDL.
//! Nothing in this module touches a connection.

mod builder;

pub use builder::StatementBuilder;

/// Optional clauses of a SELECT statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectClauses<'a> {
    pub distinct: bool,
    pub selection: Option<&'a str>,
    pub group_by: Option<&'a str>,
    pub having: Option<&'a str>,
    pub order_by: Option<&'a str>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Build an INSERT statement.
///
/// The version column, when present, is never a bound parameter: it is
/// always initialized with the literal `0`. The number of placeholders is
/// therefore always `columns.len()`.
pub fn build_insert(table: &str, columns: &[&str], version: Option<&str>) -> String {
    if columns.is_empty() && version.is_none() {
        return format!("INSERT INTO {} DEFAULT VALUES", table);
    }

    let mut sql = String::from("INSERT INTO ");
    sql.push_str(table);
    sql.push_str(" (");
    push_quoted_list(&mut sql, columns.iter().copied().chain(version));
    sql.push_str(") VALUES (");
    push_placeholders(&mut sql, columns.len());
    if version.is_some() {
        if !columns.is_empty() {
            sql.push(',');
        }
        sql.push('0');
    }
    sql.push(')');
    sql
}

/// Build an UPDATE statement.
///
/// Parameters are the update columns in order, then the id, then the
/// version (when present). The version column is incremented by the
/// statement itself.
pub fn build_update(
    table: &str,
    update_columns: &[&str],
    id: &str,
    version: Option<&str>,
) -> String {
    let mut sql = String::from("UPDATE ");
    sql.push_str(table);
    sql.push_str(" SET ");
    for (i, column) in update_columns.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        push_quoted(&mut sql, column);
        sql.push_str("=?");
    }
    if let Some(version) = version {
        if !update_columns.is_empty() {
            sql.push(',');
        }
        sql.push_str(&format!("{version}={version} + 1"));
    }
    push_where_id(&mut sql, id, version);
    sql
}

/// Build a DELETE statement keyed by id (and version when present).
pub fn build_delete(table: &str, id: &str, version: Option<&str>) -> String {
    let mut sql = String::from("DELETE FROM ");
    sql.push_str(table);
    push_where_id(&mut sql, id, version);
    sql
}

/// Build a SELECT statement over the given columns.
pub fn build_select(table: &str, columns: &[&str], clauses: &SelectClauses<'_>) -> String {
    let mut sql = String::from("SELECT ");
    if clauses.distinct {
        sql.push_str("DISTINCT ");
    }
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        sql.push_str(&quote_identifier(column));
    }
    sql.push_str(" FROM ");
    sql.push_str(table);
    push_tail(&mut sql, clauses);
    sql
}

/// Build a `SELECT COUNT(*)` statement honoring the selection clauses.
pub fn build_count(table: &str, clauses: &SelectClauses<'_>) -> String {
    let mut sql = format!("SELECT COUNT(*) FROM {}", table);
    push_tail(&mut sql, clauses);
    sql
}

/// Quote an identifier for use in expression position (SELECT list, WHERE).
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn push_tail(sql: &mut String, clauses: &SelectClauses<'_>) {
    let optional = [
        (" WHERE ", clauses.selection),
        (" GROUP BY ", clauses.group_by),
        (" HAVING ", clauses.having),
        (" ORDER BY ", clauses.order_by),
    ];
    for (keyword, value) in optional {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            sql.push_str(keyword);
            sql.push_str(value);
        }
    }
    match (clauses.limit, clauses.offset) {
        (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
        (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
        // SQLite requires a LIMIT before OFFSET; -1 means unbounded.
        (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
        (None, None) => {}
    }
}

fn push_where_id(sql: &mut String, id: &str, version: Option<&str>) {
    sql.push_str(" WHERE ");
    sql.push_str(id);
    sql.push_str("=?");
    if let Some(version) = version {
        sql.push_str(" AND ");
        sql.push_str(version);
        sql.push_str("=?");
    }
}

fn push_quoted(sql: &mut String, column: &str) {
    sql.push('\'');
    sql.push_str(column);
    sql.push('\'');
}

fn push_quoted_list<'a>(sql: &mut String, columns: impl Iterator<Item = &'a str>) {
    for (i, column) in columns.enumerate() {
        if i > 0 {
            sql.push(',');
        }
        push_quoted(sql, column);
    }
}

fn push_placeholders(sql: &mut String, count: usize) {
    for i in 0..count {
        if i > 0 {
            sql.push(',');
        }
        sql.push('?');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_without_version() {
        assert_eq!(
            build_insert("T", &["A", "B"], None),
            "INSERT INTO T ('A','B') VALUES (?,?)"
        );
    }

    #[test]
    fn test_insert_with_version_uses_literal_zero() {
        assert_eq!(
            build_insert("T", &["A"], Some("V")),
            "INSERT INTO T ('A','V') VALUES (?,0)"
        );
        assert_eq!(build_insert("T", &[], Some("V")), "INSERT INTO T ('V') VALUES (0)");
    }

    #[test]
    fn test_insert_with_no_columns() {
        assert_eq!(build_insert("T", &[], None), "INSERT INTO T DEFAULT VALUES");
    }

    #[test]
    fn test_update_with_version() {
        let sql = build_update("T", &["A"], "ID", Some("V"));
        let (set, predicate) = sql.split_once(" WHERE ").unwrap();
        assert!(set.contains("'A'=?"));
        assert!(set.contains("V=V + 1"));
        assert!(predicate.contains("ID=?"));
        assert!(predicate.contains("V=?"));
        // id and version predicates are joined with AND, not a comma
        assert_eq!(sql, "UPDATE T SET 'A'=?,V=V + 1 WHERE ID=? AND V=?");
    }

    #[test]
    fn test_update_without_version() {
        assert_eq!(
            build_update("T", &["A", "B"], "ID", None),
            "UPDATE T SET 'A'=?,'B'=? WHERE ID=?"
        );
    }

    #[test]
    fn test_update_version_only() {
        assert_eq!(
            build_update("T", &[], "ID", Some("V")),
            "UPDATE T SET V=V + 1 WHERE ID=? AND V=?"
        );
    }

    #[test]
    fn test_delete() {
        assert_eq!(build_delete("T", "ID", None), "DELETE FROM T WHERE ID=?");
        assert_eq!(build_delete("T", "ID", Some("V")), "DELETE FROM T WHERE ID=? AND V=?");
    }

    #[test]
    fn test_select_clauses() {
        let clauses = SelectClauses {
            selection: Some("\"A\"=?"),
            order_by: Some("\"B\" DESC"),
            limit: Some(10),
            offset: Some(5),
            ..Default::default()
        };
        assert_eq!(
            build_select("T", &["ID", "A", "B"], &clauses),
            "SELECT \"ID\",\"A\",\"B\" FROM T WHERE \"A\"=? ORDER BY \"B\" DESC LIMIT 10 OFFSET 5"
        );
    }

    #[test]
    fn test_select_skips_blank_clauses() {
        let clauses = SelectClauses {
            distinct: true,
            selection: Some("  "),
            offset: Some(3),
            ..Default::default()
        };
        assert_eq!(
            build_select("T", &["A"], &clauses),
            "SELECT DISTINCT \"A\" FROM T LIMIT -1 OFFSET 3"
        );
    }

    #[test]
    fn test_count() {
        let clauses = SelectClauses {
            selection: Some("\"A\" IS NULL"),
            ..Default::default()
        };
        assert_eq!(build_count("T", &clauses), "SELECT COUNT(*) FROM T WHERE \"A\" IS NULL");
    }
}
