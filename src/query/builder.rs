//! Fluent query builder rendering to [`RawQuery`].

use crate::Result;
use crate::query::RawQuery;
use crate::query::criterion::{Criterion, column as resolve};
use crate::schema::{SortOrder, TypeDefinition};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Criterion>,
    distinct: bool,
    group_by: Vec<String>,
    having: Option<Criterion>,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a criterion; multiple filters are joined with AND.
    pub fn filter(mut self, criterion: Criterion) -> Self {
        self.filters.push(criterion);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by.push(field.into());
        self
    }

    pub fn having(mut self, criterion: Criterion) -> Self {
        self.having = Some(criterion);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((field.into(), order));
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

    /// Resolve field names against `definition` and render the clauses.
    pub fn to_raw(&self, definition: &TypeDefinition) -> Result<RawQuery> {
        let mut args = Vec::new();

        let selection = match self.filters.as_slice() {
            [] => None,
            [single] => Some(single.render(definition, &mut args)?),
            many => Some(Criterion::And(many.to_vec()).render(definition, &mut args)?),
        };

        let group_by = self
            .group_by
            .iter()
            .map(|field| resolve(definition, field))
            .collect::<Result<Vec<_>>>()?;

        let having = match &self.having {
            Some(criterion) => Some(criterion.render(definition, &mut args)?),
            None => None,
        };

        let order_by = self
            .order_by
            .iter()
            .map(|(field, order)| Ok(format!("{} {}", resolve(definition, field)?, order.as_str())))
            .collect::<Result<Vec<_>>>()?;

        Ok(RawQuery {
            distinct: self.distinct,
            selection,
            args,
            group_by: non_empty(group_by),
            having,
            order_by: non_empty(order_by),
            limit: self.limit,
            offset: self.offset,
        })
    }
}

fn non_empty(parts: Vec<String>) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::schema::{EntityDeclaration, FieldDeclaration, compile};

    fn definition() -> TypeDefinition {
        let declaration = EntityDeclaration::new("Person")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("name", "String"))
            .field(FieldDeclaration::column("age", "i32"));
        compile(&[declaration]).definitions.remove(0)
    }

    #[test]
    fn test_renders_all_clauses() {
        let raw = Query::new()
            .filter(Criterion::gt("age", 20))
            .filter(Criterion::like("name", "A%"))
            .group_by("age")
            .having(Criterion::sql("COUNT(*) > ?", [1]))
            .order_by("name", SortOrder::Desc)
            .limit(5)
            .offset(10)
            .distinct()
            .to_raw(&definition())
            .unwrap();

        assert_eq!(raw.selection.as_deref(), Some("(\"AGE\">?) AND (\"NAME\" LIKE ?)"));
        assert_eq!(raw.group_by.as_deref(), Some("\"AGE\""));
        assert_eq!(raw.having.as_deref(), Some("(COUNT(*) > ?)"));
        assert_eq!(raw.order_by.as_deref(), Some("\"NAME\" DESC"));
        assert_eq!(
            raw.args,
            vec![Value::Int(20), Value::Text("A%".to_string()), Value::Int(1)]
        );
        assert_eq!((raw.limit, raw.offset, raw.distinct), (Some(5), Some(10), true));
    }

    #[test]
    fn test_empty_query() {
        let raw = Query::new().to_raw(&definition()).unwrap();
        assert_eq!(raw, RawQuery::default());
    }

    #[test]
    fn test_unknown_order_field() {
        assert!(Query::new().order_by("height", SortOrder::Asc).to_raw(&definition()).is_err());
    }
}
