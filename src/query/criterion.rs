//! Selection criteria over declared fields
//!
//! Criteria name fields, not columns. Rendering resolves each field through
//! the type definition and emits `?` placeholders with their arguments in
//! placeholder order. Date arguments are stored the way the column stores
//! them.

use rusqlite::types::Value as SqlValue;

use crate::model::{Value, convert};
use crate::schema::{PropertyDefinition, ScalarKind, TypeDefinition};
use crate::sql::quote_identifier;
use crate::{Error, Result};

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    Glob,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Like => " LIKE ",
            Operator::Glob => " GLOB ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Compare { field: String, op: Operator, value: Value },
    Between { field: String, low: Value, high: Value },
    In { field: String, values: Vec<Value> },
    IsNull { field: String },
    IsNotNull { field: String },
    IdEq(i64),
    Sql { text: String, args: Vec<Value> },
    And(Vec<Criterion>),
    Or(Vec<Criterion>),
    Not(Box<Criterion>),
}

fn compare(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Criterion {
    Criterion::Compare {
        field: field.into(),
        op,
        value: value.into(),
    }
}

impl Criterion {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(field, Operator::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(field, Operator::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(field, Operator::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(field, Operator::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(field, Operator::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        compare(field, Operator::Ge, value)
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        compare(field, Operator::Like, pattern.into())
    }

    pub fn glob(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        compare(field, Operator::Glob, pattern.into())
    }

    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Criterion::Between {
            field: field.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    pub fn in_<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Criterion::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Criterion::IsNull { field: field.into() }
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Criterion::IsNotNull { field: field.into() }
    }

    pub fn id_eq(id: i64) -> Self {
        Criterion::IdEq(id)
    }

    /// Raw SQL fragment with its own `?` arguments.
    pub fn sql<I, V>(text: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Criterion::Sql {
            text: text.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(criteria: impl IntoIterator<Item = Criterion>) -> Self {
        Criterion::And(criteria.into_iter().collect())
    }

    pub fn or(criteria: impl IntoIterator<Item = Criterion>) -> Self {
        Criterion::Or(criteria.into_iter().collect())
    }

    pub fn not(self) -> Self {
        Criterion::Not(Box::new(self))
    }

    /// Render into SQL text, appending arguments to `args`.
    pub fn render(&self, definition: &TypeDefinition, args: &mut Vec<Value>) -> Result<String> {
        let sql = match self {
            Criterion::Compare { field, op, value } => {
                let property = property(definition, field)?;
                args.push(argument(property, value)?);
                format!("{}{}?", quote_identifier(property.column_name()), op.as_str())
            }
            Criterion::Between { field, low, high } => {
                let property = property(definition, field)?;
                args.push(argument(property, low)?);
                args.push(argument(property, high)?);
                format!("{} BETWEEN ? AND ?", quote_identifier(property.column_name()))
            }
            Criterion::In { field, values } => {
                let property = property(definition, field)?;
                let name = quote_identifier(property.column_name());
                if values.is_empty() {
                    // empty IN matches nothing
                    "0".to_string()
                } else {
                    for value in values {
                        args.push(argument(property, value)?);
                    }
                    let placeholders = vec!["?"; values.len()].join(",");
                    format!("{} IN ({})", name, placeholders)
                }
            }
            Criterion::IsNull { field } => format!("{} IS NULL", column(definition, field)?),
            Criterion::IsNotNull { field } => format!("{} IS NOT NULL", column(definition, field)?),
            Criterion::IdEq(id) => {
                args.push(Value::Long(*id));
                format!("{}=?", quote_identifier(definition.id().column_name()))
            }
            Criterion::Sql { text, args: own } => {
                args.extend(own.iter().cloned());
                format!("({})", text)
            }
            Criterion::And(criteria) => join(definition, criteria, " AND ", "1", args)?,
            Criterion::Or(criteria) => join(definition, criteria, " OR ", "0", args)?,
            Criterion::Not(inner) => format!("NOT ({})", inner.render(definition, args)?),
        };
        Ok(sql)
    }
}

fn property<'a>(definition: &'a TypeDefinition, field: &str) -> Result<&'a PropertyDefinition> {
    definition
        .property(field)
        .ok_or_else(|| Error::UnknownField(format!("{}.{}", definition.type_name(), field)))
}

/// Quoted column for a field name (or column name).
pub(crate) fn column(definition: &TypeDefinition, field: &str) -> Result<String> {
    property(definition, field).map(|p| quote_identifier(p.column_name()))
}

/// A date compared against a column is encoded with that column's storage.
fn argument(property: &PropertyDefinition, value: &Value) -> Result<Value> {
    let date_column = matches!(property.kind(), ScalarKind::DateLong | ScalarKind::DateString);
    if !date_column || !matches!(value, Value::Date(_)) {
        return Ok(value.clone());
    }
    let stored = match convert::to_sql(property, value.clone())? {
        SqlValue::Text(text) => Value::Text(text),
        SqlValue::Integer(millis) => Value::Long(millis),
        _ => value.clone(),
    };
    Ok(stored)
}

fn join(
    definition: &TypeDefinition,
    criteria: &[Criterion],
    separator: &str,
    empty: &str,
    args: &mut Vec<Value>,
) -> Result<String> {
    if criteria.is_empty() {
        return Ok(empty.to_string());
    }
    let parts = criteria
        .iter()
        .map(|c| c.render(definition, args).map(|sql| format!("({})", sql)))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(separator))
}
