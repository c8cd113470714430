//! Module: value
//! Responsibility: raw values extracted from result sets and submitted by
//! filter forms, plus their canonical ordering and string projection.
//! Does not own: option keys or labels (see `format`).

mod compare;
mod date;
mod record;


use serde::{Serialize, Serializer, ser::SerializeSeq};

// re-exports
pub use date::{Date, Timestamp};
pub use record::Record;

///
/// Value
///
/// Raw value as produced by a data source or submitted by a filter form.
///
/// Null      → SQL NULL / missing field; never becomes an option.
/// Enum      → tagged value carrying its own display label.
/// Record    → composite row or related entity.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Date(Date),
    Timestamp(Timestamp),
    Enum(ValueEnum),
    List(Vec<Self>),
    Record(Record),
}

impl Value {
    /// Plain scalars are the only values eligible for label-map lookup.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::Int(_) | Self::Uint(_) | Self::Float(_) | Self::Text(_)
        )
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::List(_) | Self::Record(_))
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Form-input emptiness: null or the empty string.
    /// `false` and `0` are present values.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// String projection used for in-memory search and loose comparisons.
    ///
    /// Temporal values project as their ISO date, tagged values as their
    /// tag, booleans as `1`/`0`, composites as canonical JSON.
    #[must_use]
    pub fn text_projection(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(v) => v.to_string(),
            Self::Uint(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(text) => text.clone(),
            Self::Date(d) => d.to_iso(),
            Self::Timestamp(ts) => ts.date().to_iso(),
            Self::Enum(e) => e.tag.text_projection(),
            Self::List(_) | Self::Record(_) => self.to_canonical_json(),
        }
    }

    /// Canonical JSON encoding; composites serialize with sorted fields.
    #[must_use]
    pub fn to_canonical_json(&self) -> String {
        // Value serialization is infallible: no maps with non-string keys.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Uint(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Date(d) => d.serialize(serializer),
            Self::Timestamp(ts) => ts.serialize(serializer),
            Self::Enum(e) => e.tag.serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Record(record) => record.serialize(serializer),
        }
    }
}

///
/// ValueEnum
///
/// Tagged value: the tag is what gets stored and submitted, the label is
/// what the enumeration exposes for display.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ValueEnum {
    pub tag: Box<Value>,
    pub label: String,
}

impl ValueEnum {
    #[must_use]
    pub fn new(tag: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            tag: Box::new(tag.into()),
            label: label.into(),
        }
    }
}

///
/// Conversions
///

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

impl From<ValueEnum> for Value {
    fn from(value: ValueEnum) -> Self {
        Self::Enum(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
