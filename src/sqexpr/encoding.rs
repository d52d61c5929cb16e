//! Canonical text encoding of constant values.
//!
//! | Type     | Encoding                      |
//! |----------|-------------------------------|
//! | text     | `'it''s'` (quotes doubled)    |
//! | integer  | `42L`                         |
//! | double   | `1.5D`                        |
//! | decimal  | `1.5M`                        |
//! | boolean  | `true` / `false`              |
//! | datetime | `datetime'2015-01-02T03:04:05'` |
//! | null     | `null`                        |

use chrono::NaiveDateTime;

use crate::types::{DataValue, PrimitiveType, ValueType};

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn encode_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn encode_integer(value: i64) -> String {
    format!("{value}L")
}

pub fn encode_double(value: f64) -> String {
    format!("{value}D")
}

pub fn encode_decimal(value: f64) -> String {
    format!("{value}M")
}

pub fn encode_boolean(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

pub fn encode_date_time(value: &NaiveDateTime) -> String {
    format!("datetime'{}'", value.format(DATE_TIME_FORMAT))
}

pub const NULL_ENCODED: &str = "null";

/// Encode `value` as a constant of `value_type`.
///
/// Numbers are encoded with the suffix of the declared numeric type; a
/// value that does not fit its declared type falls back to the encoding of
/// its runtime type.
pub fn encode_value(value: &DataValue, value_type: &ValueType) -> String {
    match value {
        DataValue::Null => NULL_ENCODED.to_string(),
        DataValue::Bool(b) => encode_boolean(*b),
        DataValue::Text(s) => encode_text(s),
        DataValue::DateTime(dt) => encode_date_time(&dt.value),
        DataValue::Number(n) => match value_type.primitive_type() {
            PrimitiveType::Integer if n.fract() == 0.0 => encode_integer(*n as i64),
            PrimitiveType::Decimal => encode_decimal(*n),
            _ => encode_double(*n),
        },
    }
}
