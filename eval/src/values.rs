//! Values used by the evaluator.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use hashbrown::HashMap;

use core::{cmp::Ordering, fmt};

/// Possible types of [`Value`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ValueType {
    /// Arbitrary-precision decimal number.
    Number,
    /// String.
    String,
    /// Boolean value.
    Bool,
    /// Point in time.
    DateTime,
    /// Signed time span.
    Duration,
    /// Array of values.
    Array,
    /// Structure, i.e., a map from field names to values.
    Structure,
    /// Absence of a value.
    Null,
}

impl fmt::Display for ValueType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Number => "NUMBER",
            Self::String => "STRING",
            Self::Bool => "BOOLEAN",
            Self::DateTime => "DATE_TIME",
            Self::Duration => "DURATION",
            Self::Array => "ARRAY",
            Self::Structure => "STRUCTURE",
            Self::Null => "NULL",
        })
    }
}

/// Value that expressions operate on.
///
/// Values are immutable once created; operations produce new values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Number.
    Number(BigDecimal),
    /// String.
    String(String),
    /// Boolean value.
    Bool(bool),
    /// Point in time.
    DateTime(DateTime<Utc>),
    /// Signed time span.
    Duration(Duration),
    /// Array.
    Array(Vec<Value>),
    /// Structure.
    Structure(HashMap<String, Value>),
    /// Absence of a value.
    Null,
}

impl Value {
    /// Returns the type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
            Self::Bool(_) => ValueType::Bool,
            Self::DateTime(_) => ValueType::DateTime,
            Self::Duration(_) => ValueType::Duration,
            Self::Array(_) => ValueType::Array,
            Self::Structure(_) => ValueType::Structure,
            Self::Null => ValueType::Null,
        }
    }

    /// Checks if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the number if this value is a number.
    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Self::Number(number) => Some(number),
            _ => None,
        }
    }

    /// Returns the string if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the Boolean value if this value is Boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the timestamp if this value is a date-time.
    pub fn as_date_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(timestamp) => Some(timestamp),
            _ => None,
        }
    }

    /// Returns the time span if this value is a duration.
    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Self::Duration(duration) => Some(duration),
            _ => None,
        }
    }

    /// Returns array elements if this value is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns structure fields if this value is a structure.
    pub fn as_structure(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Self::Structure(fields) => Some(fields),
            _ => None,
        }
    }

    /// Compares this value to `other`. Only numbers, strings, date-times, durations and Boolean
    /// values are ordered, and only among values of the same type; for other combinations,
    /// returns `None`.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(x), Self::Number(y)) => Some(x.cmp(y)),
            (Self::String(x), Self::String(y)) => Some(x.cmp(y)),
            (Self::DateTime(x), Self::DateTime(y)) => Some(x.cmp(y)),
            (Self::Duration(x), Self::Duration(y)) => Some(x.cmp(y)),
            (Self::Bool(x), Self::Bool(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => fmt::Display::fmt(number, formatter),
            Self::String(s) => formatter.write_str(s),
            Self::Bool(flag) => fmt::Display::fmt(flag, formatter),
            Self::DateTime(timestamp) => write!(formatter, "{}", timestamp.to_rfc3339()),
            Self::Duration(duration) => fmt::Display::fmt(duration, formatter),
            Self::Array(array) => {
                formatter.write_str("[")?;
                for (i, element) in array.iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    fmt::Display::fmt(element, formatter)?;
                }
                formatter.write_str("]")
            }
            Self::Structure(fields) => {
                let mut fields: Vec<_> = fields.iter().collect();
                fields.sort_unstable_by(|(x, _), (y, _)| x.cmp(y));
                formatter.write_str("{")?;
                for (i, (name, value)) in fields.into_iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    write!(formatter, "{name}: {value}")?;
                }
                formatter.write_str("}")
            }
            Self::Null => formatter.write_str("null"),
        }
    }
}

impl From<BigDecimal> for Value {
    fn from(number: BigDecimal) -> Self {
        Self::Number(number)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Self::Number(number.into())
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Number(number.into())
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self::DateTime(timestamp)
    }
}

impl From<Duration> for Value {
    fn from(duration: Duration) -> Self {
        Self::Duration(duration)
    }
}

impl From<Vec<Value>> for Value {
    fn from(array: Vec<Value>) -> Self {
        Self::Array(array)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(fields: HashMap<String, Value>) -> Self {
        Self::Structure(fields)
    }
}

impl<T: Into<Value>> FromIterator<(String, T)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let fields = iter.into_iter().map(|(name, value)| (name, value.into()));
        Self::Structure(fields.collect())
    }
}
