use std::fmt;

use serde::{Deserialize, Serialize};

/// A content value, tagged at decode time from its JSON wire form.
///
/// Integral numbers that fit an `i64` decode as [`Value::Integer`], every
/// other number as [`Value::Float`]. Null, arrays and objects are kept
/// verbatim as [`Value::Other`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Other(serde_json::Value),
}

/// The value-type tag recorded by the data model for an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Float,
    Bool,
    Other,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::String(_) => ValueType::String,
            Self::Other(_) => ValueType::Other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert back into a plain JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Other(v) => v.clone(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Other(serde_json::Value::Number(n)), Self::Float),
            },
            other => Self::Other(other),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn wire_values_get_tags() {
        assert_eq!(decode(r#""val1""#).value_type(), ValueType::String);
        assert_eq!(decode("3").value_type(), ValueType::Integer);
        assert_eq!(decode("-3").value_type(), ValueType::Integer);
        assert_eq!(decode("3.14").value_type(), ValueType::Float);
        assert_eq!(decode("true").value_type(), ValueType::Bool);
        assert_eq!(decode("null").value_type(), ValueType::Other);
        assert_eq!(decode("[1,2]").value_type(), ValueType::Other);
        assert_eq!(decode(r#"{"a":1}"#).value_type(), ValueType::Other);
    }

    #[test]
    fn floats_stay_floats_on_the_wire() {
        let json = serde_json::to_string(&Value::Float(3.0)).unwrap();
        assert_eq!(decode(&json), Value::Float(3.0));
    }

    #[test]
    fn json_conversion_matches_decoding() {
        for raw in [r#""x""#, "1", "1.5", "false", "null", "[true]"] {
            let json: serde_json::Value = serde_json::from_str(raw).unwrap();
            assert_eq!(Value::from(json.clone()), decode(raw));
            assert_eq!(decode(raw).to_json(), json);
        }
    }

    #[test]
    fn tag_names() {
        assert_eq!(ValueType::Integer.to_string(), "integer");
        assert_eq!(serde_json::to_string(&ValueType::Bool).unwrap(), r#""bool""#);
        let parsed: ValueType = serde_json::from_str(r#""float""#).unwrap();
        assert_eq!(parsed, ValueType::Float);
    }
}
