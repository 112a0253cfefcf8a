//! Driver metadata and cells to native descriptions and values.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};
use crate::types::{ColumnDescription, ColumnMetadata, DriverValue, TypeCode, Value};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The native representation chosen for a type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    Timestamp,
    Date,
    /// ARRAY, MAP and ROW values, rendered as text.
    Composite,
    /// Decimal columns cannot be fetched.
    Unsupported,
    Null,
}

pub fn native_kind(type_code: TypeCode) -> NativeKind {
    match type_code {
        TypeCode::BOOLEAN | TypeCode::BIT => NativeKind::Bool,
        TypeCode::TINYINT | TypeCode::SMALLINT | TypeCode::INTEGER | TypeCode::BIGINT => {
            NativeKind::Int
        }
        TypeCode::FLOAT | TypeCode::REAL | TypeCode::DOUBLE => NativeKind::Float,
        TypeCode::CHAR
        | TypeCode::VARCHAR
        | TypeCode::LONGVARCHAR
        | TypeCode::NCHAR
        | TypeCode::NVARCHAR
        | TypeCode::LONGNVARCHAR => NativeKind::Text,
        TypeCode::TIMESTAMP => NativeKind::Timestamp,
        TypeCode::DATE => NativeKind::Date,
        TypeCode::BINARY | TypeCode::VARBINARY | TypeCode::LONGVARBINARY => NativeKind::Bytes,
        TypeCode::ARRAY | TypeCode::JAVA_OBJECT | TypeCode::STRUCT | TypeCode::OTHER => {
            NativeKind::Composite
        }
        TypeCode::DECIMAL | TypeCode::NUMERIC => NativeKind::Unsupported,
        TypeCode::NULL => NativeKind::Null,
        _ => NativeKind::Composite,
    }
}

/// Build the cursor description entry for a driver column.
pub fn describe(column: &ColumnMetadata) -> ColumnDescription {
    ColumnDescription::new(
        column.name.clone(),
        column.type_code,
        column.display_size,
        column.precision,
        column.scale,
        column.nullable,
    )
}

/// Convert one driver cell to its native value.
pub fn to_native(column: &ColumnDescription, value: DriverValue) -> Result<Value> {
    let kind = native_kind(column.type_code);
    if kind == NativeKind::Unsupported {
        return Err(Error::NotSupported(format!(
            "cannot fetch column {} of type {}: index out of bounds",
            column.name, column.type_code
        )));
    }
    if value.is_null() {
        return Ok(Value::Null);
    }

    let converted = match kind {
        NativeKind::Bool => to_bool(value),
        NativeKind::Int => to_int(value),
        NativeKind::Float => to_float(value),
        NativeKind::Text => to_text(value),
        NativeKind::Bytes => match value {
            DriverValue::Bytes(bytes) => Ok(Value::Bytes(bytes)),
            DriverValue::Text(s) => Ok(Value::Bytes(s.into_bytes())),
            other => Err(other),
        },
        NativeKind::Timestamp => to_timestamp(value),
        NativeKind::Date => to_date(value),
        NativeKind::Composite | NativeKind::Null => match value {
            DriverValue::Text(s) => Ok(Value::Text(s)),
            other => Ok(Value::Text(other.to_string())),
        },
        NativeKind::Unsupported => Err(value),
    };
    converted.map_err(|value| mismatch(column, &value))
}

fn to_bool(value: DriverValue) -> std::result::Result<Value, DriverValue> {
    match value {
        DriverValue::Bool(b) => Ok(Value::Bool(b)),
        DriverValue::Int(i) => Ok(Value::Bool(i != 0)),
        DriverValue::Text(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        DriverValue::Text(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        other => Err(other),
    }
}

fn to_int(value: DriverValue) -> std::result::Result<Value, DriverValue> {
    match value {
        DriverValue::Int(i) => Ok(Value::Int(i)),
        DriverValue::Text(s) => match s.trim().parse() {
            Ok(i) => Ok(Value::Int(i)),
            Err(_) => Err(DriverValue::Text(s)),
        },
        other => Err(other),
    }
}

fn to_float(value: DriverValue) -> std::result::Result<Value, DriverValue> {
    match value {
        DriverValue::Double(d) => Ok(Value::Float(d)),
        DriverValue::Int(i) => Ok(Value::Float(i as f64)),
        DriverValue::Text(s) => match s.trim().parse() {
            Ok(f) => Ok(Value::Float(f)),
            Err(_) => Err(DriverValue::Text(s)),
        },
        other => Err(other),
    }
}

fn to_text(value: DriverValue) -> std::result::Result<Value, DriverValue> {
    match value {
        DriverValue::Text(s) => Ok(Value::Text(s)),
        DriverValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => Ok(Value::Text(s)),
            Err(e) => Err(DriverValue::Bytes(e.into_bytes())),
        },
        other => Ok(Value::Text(other.to_string())),
    }
}

fn to_timestamp(value: DriverValue) -> std::result::Result<Value, DriverValue> {
    match value {
        DriverValue::Timestamp(ts) => Ok(Value::Timestamp(ts)),
        DriverValue::Text(s) => match parse_timestamp(&s) {
            Some(ts) => Ok(Value::Timestamp(ts)),
            None => Err(DriverValue::Text(s)),
        },
        other => Err(other),
    }
}

fn to_date(value: DriverValue) -> std::result::Result<Value, DriverValue> {
    match value {
        DriverValue::Date(d) => Ok(Value::Date(d)),
        DriverValue::Text(s) => match NaiveDate::parse_from_str(s.trim(), DATE_FORMAT) {
            Ok(d) => Ok(Value::Date(d)),
            Err(_) => Err(DriverValue::Text(s)),
        },
        other => Err(other),
    }
}

/// Convert a full driver row, one cell per description entry.
pub fn row_to_native(columns: &[ColumnDescription], cells: Vec<DriverValue>) -> Result<Vec<Value>> {
    if cells.len() != columns.len() {
        return Err(Error::Interface(format!(
            "driver returned {} values for {} columns",
            cells.len(),
            columns.len()
        )));
    }
    columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| to_native(column, cell))
        .collect()
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s.trim(), fmt).ok())
}

fn mismatch(column: &ColumnDescription, value: &DriverValue) -> Error {
    Error::Interface(format!(
        "column {} of type {} cannot hold driver value {:?}",
        column.name, column.type_code, value
    ))
}
