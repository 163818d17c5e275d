//! Conversions between field values and stored column values.
//!
//! The property's [`ScalarKind`] decides the storage form: bool as 0/1,
//! char as one-character text, dates as epoch milliseconds or formatted
//! text. Reads narrow integers with range checks.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::model::value::Value;
use crate::schema::{PropertyDefinition, ScalarKind};
use crate::{Error, Result};

fn conversion_error(property: &PropertyDefinition, message: impl Into<String>) -> Error {
    Error::Conversion {
        field: property.field_name().to_string(),
        message: message.into(),
    }
}

/// Convert a field value into its stored form.
pub fn to_sql(property: &PropertyDefinition, value: Value) -> Result<SqlValue> {
    let kind = property.kind();
    let stored = match (kind, value) {
        (_, Value::Null) => SqlValue::Null,
        (ScalarKind::Bool, Value::Bool(v)) => SqlValue::Integer(i64::from(v)),
        (ScalarKind::Char, Value::Char(v)) => SqlValue::Text(v.to_string()),
        (ScalarKind::Byte | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long, value)
            if value.as_i64().is_some() =>
        {
            let wide = value.as_i64().unwrap_or_default();
            check_range(property, wide)?;
            SqlValue::Integer(wide)
        }
        (ScalarKind::Float, Value::Float(v)) => SqlValue::Real(f64::from(v)),
        (ScalarKind::Double, Value::Double(v)) => SqlValue::Real(v),
        (ScalarKind::Double, Value::Float(v)) => SqlValue::Real(f64::from(v)),
        (ScalarKind::String, Value::Text(v)) => SqlValue::Text(v),
        (ScalarKind::Bytes, Value::Bytes(v)) => SqlValue::Blob(v),
        (ScalarKind::DateLong, Value::Date(v)) => SqlValue::Integer(v.timestamp_millis()),
        (ScalarKind::DateString, Value::Date(v)) => {
            SqlValue::Text(format_date(property, &v)?)
        }
        (kind, other) => {
            return Err(conversion_error(
                property,
                format!("cannot store {} in a {} column", other.type_name(), kind),
            ));
        }
    };
    Ok(stored)
}

/// Convert a stored column value back into a field value.
pub fn from_sql(property: &PropertyDefinition, stored: ValueRef<'_>) -> Result<Value> {
    if let ValueRef::Null = stored {
        return Ok(Value::Null);
    }
    let kind = property.kind();
    let value = match kind {
        ScalarKind::Bool => Value::Bool(read_integer(property, stored)? != 0),
        ScalarKind::Char => {
            let text = read_text(property, stored)?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => {
                    return Err(conversion_error(
                        property,
                        format!("expected a single character, found {:?}", text),
                    ));
                }
            }
        }
        ScalarKind::Byte | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long => {
            let wide = read_integer(property, stored)?;
            check_range(property, wide)?;
            match kind {
                ScalarKind::Byte => Value::Byte(wide as i8),
                ScalarKind::Short => Value::Short(wide as i16),
                ScalarKind::Int => Value::Int(wide as i32),
                _ => Value::Long(wide),
            }
        }
        ScalarKind::Float => Value::Float(read_real(property, stored)? as f32),
        ScalarKind::Double => Value::Double(read_real(property, stored)?),
        ScalarKind::String => Value::Text(read_text(property, stored)?),
        ScalarKind::Bytes => match stored {
            ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
            ValueRef::Text(bytes) => Value::Bytes(bytes.to_vec()),
            other => {
                return Err(conversion_error(
                    property,
                    format!("expected a blob, found {}", other.data_type()),
                ));
            }
        },
        ScalarKind::DateLong => {
            let millis = read_integer(property, stored)?;
            let date = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                conversion_error(property, format!("timestamp {} out of range", millis))
            })?;
            Value::Date(date)
        }
        ScalarKind::DateString => {
            let text = read_text(property, stored)?;
            Value::Date(parse_date(property, &text)?)
        }
    };
    Ok(value)
}

fn check_range(property: &PropertyDefinition, wide: i64) -> Result<()> {
    let fits = match property.kind() {
        ScalarKind::Byte => i8::try_from(wide).is_ok(),
        ScalarKind::Short => i16::try_from(wide).is_ok(),
        ScalarKind::Int => i32::try_from(wide).is_ok(),
        _ => true,
    };
    if fits {
        Ok(())
    } else {
        Err(conversion_error(
            property,
            format!("{} out of range for a {} column", wide, property.kind()),
        ))
    }
}

fn read_integer(property: &PropertyDefinition, stored: ValueRef<'_>) -> Result<i64> {
    match stored {
        ValueRef::Integer(v) => Ok(v),
        // NUMERIC affinity keeps integral reals as integers, but be lenient
        ValueRef::Real(v) if v.fract() == 0.0 => Ok(v as i64),
        other => Err(conversion_error(
            property,
            format!("expected an integer, found {}", other.data_type()),
        )),
    }
}

fn read_real(property: &PropertyDefinition, stored: ValueRef<'_>) -> Result<f64> {
    match stored {
        ValueRef::Real(v) => Ok(v),
        ValueRef::Integer(v) => Ok(v as f64),
        other => Err(conversion_error(
            property,
            format!("expected a real, found {}", other.data_type()),
        )),
    }
}

fn read_text(property: &PropertyDefinition, stored: ValueRef<'_>) -> Result<String> {
    match stored {
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map_err(|e| conversion_error(property, e.to_string())),
        other => Err(conversion_error(
            property,
            format!("expected text, found {}", other.data_type()),
        )),
    }
}

fn date_format(property: &PropertyDefinition) -> Result<&str> {
    property
        .date_format()
        .ok_or_else(|| conversion_error(property, "textual date column has no format"))
}

fn format_date(property: &PropertyDefinition, date: &DateTime<Utc>) -> Result<String> {
    let format = date_format(property)?;
    let mut text = String::new();
    write!(text, "{}", date.format(format))
        .map_err(|_| conversion_error(property, format!("cannot format date with '{}'", format)))?;
    Ok(text)
}

/// Parse with the column format; formats without an offset are read as UTC
/// and date-only formats as midnight UTC.
fn parse_date(property: &PropertyDefinition, text: &str) -> Result<DateTime<Utc>> {
    let format = date_format(property)?;
    let parsed = DateTime::parse_from_str(text, format)
        .map(|d| d.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(text, format).map(|n| n.and_utc()));
    match parsed {
        Ok(date) => Ok(date),
        Err(e) => NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|n| n.and_utc())
            .ok_or_else(|| conversion_error(property, format!("cannot parse date {:?}: {}", text, e))),
    }
}
