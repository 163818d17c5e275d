//! Field values and row records.

use chrono::{DateTime, Utc};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value as SqlValue};

use crate::{Error, Result};

/// A field value in its Rust-side representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Byte(_) => "i8",
            Value::Short(_) => "i16",
            Value::Int(_) => "i32",
            Value::Long(_) => "i64",
            Value::Float(_) => "f32",
            Value::Double(_) => "f64",
            Value::Text(_) => "String",
            Value::Bytes(_) => "Vec<u8>",
            Value::Date(_) => "DateTime<Utc>",
        }
    }

    /// Integer value widened to i64, if this is an integer kind
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Engine representation used for ad-hoc query arguments.
    pub fn to_sql_value(&self) -> SqlValue {
        match self {
            Value::Null => SqlValue::Null,
            Value::Bool(v) => SqlValue::Integer(i64::from(*v)),
            Value::Char(v) => SqlValue::Text(v.to_string()),
            Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Long(_) => {
                SqlValue::Integer(self.as_i64().unwrap_or_default())
            }
            Value::Float(v) => SqlValue::Real(f64::from(*v)),
            Value::Double(v) => SqlValue::Real(*v),
            Value::Text(v) => SqlValue::Text(v.clone()),
            Value::Bytes(v) => SqlValue::Blob(v.clone()),
            Value::Date(v) => SqlValue::Integer(v.timestamp_millis()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(self.to_sql_value()))
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from!(
    bool => Bool,
    char => Char,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => Text,
    Vec<u8> => Bytes,
    DateTime<Utc> => Date,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Conversion out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> std::result::Result<Self, String>;
}

fn mismatch(expected: &str, found: &Value) -> String {
    format!("expected {}, found {}", expected, found.type_name())
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> std::result::Result<Self, String> {
                    match value {
                        Value::$variant(v) => Ok(v.clone()),
                        other => Err(mismatch(stringify!($ty), other)),
                    }
                }
            }
        )*
    };
}

impl_from_value!(
    bool => Bool,
    char => Char,
    f32 => Float,
    String => Text,
    Vec<u8> => Bytes,
    DateTime<Utc> => Date,
);

macro_rules! impl_from_value_integer {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> std::result::Result<Self, String> {
                    let wide = value.as_i64().ok_or_else(|| mismatch(stringify!($ty), value))?;
                    <$ty>::try_from(wide)
                        .map_err(|_| format!("{} out of range for {}", wide, stringify!($ty)))
                }
            }
        )*
    };
}

impl_from_value_integer!(i8, i16, i32, i64);

impl FromValue for f64 {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Double(v) => Ok(*v),
            Value::Float(v) => Ok(f64::from(*v)),
            other => Err(mismatch("f64", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// One materialized row: field name to value, in query column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, value: Value) {
        self.values.push((field.into(), value));
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, value.into());
        self
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.iter().find(|(name, _)| name == field).map(|(_, v)| v)
    }

    /// Convert a field to `T`; a NULL read into a non-optional type fails.
    pub fn get<T: FromValue>(&self, field: &str) -> Result<T> {
        let value = self
            .value(field)
            .ok_or_else(|| Error::UnknownField(field.to_string()))?;
        T::from_value(value).map_err(|message| Error::Conversion {
            field: field.to_string(),
            message,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
