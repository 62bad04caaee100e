//! Parameter values as seen by the validation layer.
//!
//! Requests arrive as JSON; the parsing/coercion layer turns the body into a
//! `Value` tree before validation runs. The one thing this tree carries that
//! JSON cannot express is [`Value::EmptyOptional`]: a placeholder the parser
//! inserts for an optional parameter that was declared but not supplied.
//! Removing those entries earlier would shift the positions of their array
//! siblings, so they stay in place and are filtered when attributes are
//! handed to a validator.

use serde::{Serialize, Serializer};

/// A parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Object fields in insertion order.
    Object(Vec<(String, Value)>),
    /// Declared-but-unsupplied optional parameter. Kept in place so array
    /// indices stay aligned with the request payload.
    EmptyOptional,
}

impl Value {
    /// True if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Get the items of an array value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up an object field by name.
    ///
    /// Returns None for non-object values and for absent fields.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields
                .iter()
                .find(|(name, _)| name.as_str() == field)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

/// Convert a parsed JSON document into a parameter value.
///
/// JSON can never produce `EmptyOptional`; only the parameter parser
/// inserts that sentinel.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Convert a parameter value back to JSON, e.g. for error payloads.
///
/// `EmptyOptional` maps to JSON null: by the time a value is serialized
/// outward the sentinel carries no extra meaning.
impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null | Value::EmptyOptional => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}
