use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value of a single command-line option.
///
/// Only [`ParamValue::Flag`] and [`ParamValue::Text`] have a command-line rendering.
/// Every other JSON value is kept as [`ParamValue::Other`] so that parameter sets
/// survive a serde round-trip, but it is never turned into tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ParamValue {
    /// Bare switch, emitted only when `true`.
    Flag(bool),
    /// Switch followed by a value token.
    Text(String),
    /// Numbers, lists, objects and `null`.
    Other(Value),
}

impl ParamValue {
    /// Returns `true` for an enabled switch.
    pub fn is_enabled_flag(&self) -> bool {
        matches!(self, ParamValue::Flag(true))
    }

    /// Returns the text value, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for ParamValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Bool(b) => ParamValue::Flag(b),
            Value::String(s) => ParamValue::Text(s),
            other => ParamValue::Other(other),
        }
    }
}

impl From<ParamValue> for Value {
    fn from(v: ParamValue) -> Self {
        match v {
            ParamValue::Flag(b) => Value::Bool(b),
            ParamValue::Text(s) => Value::String(s),
            ParamValue::Other(other) => other,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Flag(b)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}
