//! Query layer - selection over one entity type
//!
//! [`RawQuery`] carries SQL clause text with positional arguments and is what
//! the persistence engine executes. [`Query`] builds one from [`Criterion`]s
//! over declared field names.

pub mod criterion;
pub mod builder;

pub use builder::Query;
pub use criterion::{Criterion, Operator};

use crate::model::Value;
use crate::sql::SelectClauses;

/// Clauses of a SELECT over an entity's table, with `?` arguments in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuery {
    pub distinct: bool,
    pub selection: Option<String>,
    pub args: Vec<Value>,
    pub group_by: Option<String>,
    pub having: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl RawQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// WHERE clause text with its arguments.
    pub fn selection<I, V>(mut self, selection: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.selection = Some(selection.into());
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    pub fn having(mut self, having: impl Into<String>) -> Self {
        self.having = Some(having.into());
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn clauses(&self) -> SelectClauses<'_> {
        SelectClauses {
            distinct: self.distinct,
            selection: self.selection.as_deref(),
            group_by: self.group_by.as_deref(),
            having: self.having.as_deref(),
            order_by: self.order_by.as_deref(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::build_select;

    #[test]
    fn test_raw_query_renders_through_select() {
        let raw = RawQuery::new()
            .selection("\"AGE\">?", [30])
            .order_by("\"AGE\"")
            .limit(2);
        assert_eq!(
            build_select("PERSON", &["_ID", "AGE"], &raw.clauses()),
            "SELECT \"_ID\",\"AGE\" FROM PERSON WHERE \"AGE\">? ORDER BY \"AGE\" LIMIT 2"
        );
        assert_eq!(raw.args, vec![Value::Int(30)]);
    }
}
