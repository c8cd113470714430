use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// OptionKey
///
/// Scalar key of a resolved option.
///
/// Integer-like text normalizes to `Int` so that a submitted `"1"` and a
/// stored `1` address the same option.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(untagged)]
pub enum OptionKey {
    Int(i64),
    Text(String),
}

impl OptionKey {
    /// Encode a raw value as a key.
    ///
    /// Booleans become `1`/`0`, temporal values their ISO form, tagged
    /// values their tag, composites their canonical JSON.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Text(String::new()),
            Value::Bool(b) => Self::Int(i64::from(*b)),
            Value::Int(v) => Self::Int(*v),
            Value::Uint(v) => i64::try_from(*v).map_or_else(|_| Self::Text(v.to_string()), Self::Int),
            Value::Text(text) => Self::from(text.as_str()),
            Value::Timestamp(ts) => Self::Text(ts.to_iso()),
            Value::Enum(e) => Self::from_value(&e.tag),
            Value::Float(_) | Value::Date(_) | Value::List(_) | Value::Record(_) => {
                Self::Text(value.text_projection())
            }
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(v) => Value::Int(*v),
            Self::Text(text) => Value::Text(text.clone()),
        }
    }
}

impl From<i64> for OptionKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for OptionKey {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for OptionKey {
    fn from(value: &str) -> Self {
        if is_canonical_integer(value)
            && let Ok(parsed) = value.parse::<i64>()
        {
            return Self::Int(parsed);
        }

        Self::Text(value.to_string())
    }
}

impl From<String> for OptionKey {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}

// `0`, `-12`, `42`; not `007`, `-0`, `+1`, or ``.
fn is_canonical_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return false;
    }

    !(text.starts_with('-') && digits == "0")
}

///
/// TESTS
///
