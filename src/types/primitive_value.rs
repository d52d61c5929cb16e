//! Runtime values carried by DataViews and constant expressions.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::value_type::{PrimitiveType, ValueType};

/// A date-time value. Serialized as `{"$dateTime": "..."}` so it stays
/// distinguishable from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateTimeValue {
    #[serde(rename = "$dateTime")]
    pub value: NaiveDateTime,
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTimeValue),
    Text(String),
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            DataValue::DateTime(dt) => Some(dt.value),
            _ => None,
        }
    }

    /// Truthiness as used by required-property checks.
    pub fn is_truthy(&self) -> bool {
        match self {
            DataValue::Null => false,
            DataValue::Bool(b) => *b,
            DataValue::Number(n) => *n != 0.0 && !n.is_nan(),
            DataValue::Text(s) => !s.is_empty(),
            DataValue::DateTime(_) => true,
        }
    }

    /// Primitive type of the runtime value. Whole numbers report `Integer`.
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            DataValue::Null => PrimitiveType::Null,
            DataValue::Bool(_) => PrimitiveType::Boolean,
            DataValue::Number(n) if n.fract() == 0.0 && n.is_finite() => PrimitiveType::Integer,
            DataValue::Number(_) => PrimitiveType::Double,
            DataValue::DateTime(_) => PrimitiveType::DateTime,
            DataValue::Text(_) => PrimitiveType::Text,
        }
    }

    pub fn value_type(&self) -> ValueType {
        ValueType::from_primitive_type(self.primitive_type())
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Number(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Number(value as f64)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Number(value as f64)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<NaiveDateTime> for DataValue {
    fn from(value: NaiveDateTime) -> Self {
        DataValue::DateTime(DateTimeValue { value })
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DataValue::Null, Into::into)
    }
}
