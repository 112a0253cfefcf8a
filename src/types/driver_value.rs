use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// A cell value as delivered by a driver, before type mapping.
///
/// Mirrors what a JDBC `getObject` call hands back: scalars, plus composite
/// values for ARRAY, MAP and ROW/STRUCT columns.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    /// Decimal digits as text; decimal columns cannot be fetched.
    Decimal(String),
    Array(Vec<DriverValue>),
    Map(Vec<(DriverValue, DriverValue)>),
    Struct(Vec<(String, DriverValue)>),
}

impl DriverValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DriverValue::Null)
    }
}

/// Renders values the way the JDBC driver stringifies composite objects:
/// `[1, 2]`, `{1=2, 3=4}`, `{a=1, b=2}`.
impl fmt::Display for DriverValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverValue::Null => f.write_str("null"),
            DriverValue::Bool(b) => write!(f, "{}", b),
            DriverValue::Int(i) => write!(f, "{}", i),
            DriverValue::Double(d) => write!(f, "{:?}", d),
            DriverValue::Text(s) => f.write_str(s),
            DriverValue::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            DriverValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.3f")),
            DriverValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DriverValue::Decimal(digits) => f.write_str(digits),
            DriverValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            DriverValue::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                f.write_str("}")
            }
            DriverValue::Struct(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for DriverValue {
    fn from(value: &str) -> Self {
        DriverValue::Text(value.to_string())
    }
}

impl From<i64> for DriverValue {
    fn from(value: i64) -> Self {
        DriverValue::Int(value)
    }
}

impl From<i32> for DriverValue {
    fn from(value: i32) -> Self {
        DriverValue::Int(i64::from(value))
    }
}

impl From<bool> for DriverValue {
    fn from(value: bool) -> Self {
        DriverValue::Bool(value)
    }
}

impl From<f64> for DriverValue {
    fn from(value: f64) -> Self {
        DriverValue::Double(value)
    }
}

impl<T: Into<DriverValue>> From<Option<T>> for DriverValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DriverValue::Null,
        }
    }
}
