use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

/// Represents a query parameter value.
/// The query formatter renders these as SQL literals.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    /// Rendered as a parenthesized list, e.g. for `IN {0:s}`.
    List(Vec<SqlValue>),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(values: Vec<T>) -> Self {
        SqlValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Parameters bound to a query template.
///
/// Positional values fill `{0:s}`, `{1:d}` and `{}`; named values fill
/// `{name:s}`. A template may use both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    positional: Vec<SqlValue>,
    named: BTreeMap<String, SqlValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional value.
    pub fn arg(mut self, value: impl Into<SqlValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Bind a named value, replacing any earlier value under `name`.
    pub fn named_arg(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[SqlValue] {
        &self.positional
    }

    pub fn named(&self) -> &BTreeMap<String, SqlValue> {
        &self.named
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::new()
    }
}

impl From<Vec<SqlValue>> for Params {
    fn from(positional: Vec<SqlValue>) -> Self {
        Params {
            positional,
            named: BTreeMap::new(),
        }
    }
}

impl<const N: usize> From<[SqlValue; N]> for Params {
    fn from(values: [SqlValue; N]) -> Self {
        Params::from(Vec::from(values))
    }
}

impl From<BTreeMap<String, SqlValue>> for Params {
    fn from(named: BTreeMap<String, SqlValue>) -> Self {
        Params {
            positional: Vec::new(),
            named,
        }
    }
}

impl From<HashMap<String, SqlValue>> for Params {
    fn from(values: HashMap<String, SqlValue>) -> Self {
        Params::from(values.into_iter().collect::<BTreeMap<_, _>>())
    }
}

/// Builds positional [`Params`]: `params![1, "x", None::<i64>]`.
///
/// Chain [`Params::named_arg`] to add named values to the same set.
#[macro_export]
macro_rules! params {
    () => {
        $crate::types::Params::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::types::Params::from(::std::vec![$($crate::types::SqlValue::from($value)),+])
    };
}

/// Builds named [`Params`]: `named_params! { "a" => 1, "b" => "x" }`.
#[macro_export]
macro_rules! named_params {
    () => {
        $crate::types::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::types::Params::new()
            $(.named_arg($name, $value))+
    };
}
