use crate::value::{Date, Value};
use std::fmt::Write as _;

///
/// Predicate
///
/// Data description of a WHERE clause fragment.
/// Hosts translate it into their own query language; `compile` renders a
/// canonical SQL-like text plus positional bindings for hosts that want one.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq {
        column: String,
        value: Value,
    },
    DateEq {
        column: String,
        date: Date,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    /// Case-insensitive substring match.
    ContainsCi {
        column: String,
        needle: String,
    },
    Or(Vec<Self>),
    /// Row has at least one related entity matching the inner predicate.
    Exists {
        relation: String,
        predicate: Box<Self>,
    },
}

impl Predicate {
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn date_eq(column: impl Into<String>, date: Date) -> Self {
        Self::DateEq {
            column: column.into(),
            date,
        }
    }

    #[must_use]
    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            column: column.into(),
            values,
        }
    }

    #[must_use]
    pub fn contains_ci(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::ContainsCi {
            column: column.into(),
            needle: needle.into(),
        }
    }

    #[must_use]
    pub fn exists(relation: impl Into<String>, predicate: Self) -> Self {
        Self::Exists {
            relation: relation.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Render as SQL-like text, appending bound values in placeholder order.
    pub fn compile(&self, out: &mut String, bindings: &mut Vec<Value>) {
        match self {
            Self::Eq { column, value } => {
                let _ = write!(out, "{column} = ?");
                bindings.push(value.clone());
            }
            Self::DateEq { column, date } => {
                let _ = write!(out, "date({column}) = ?");
                bindings.push(Value::Date(*date));
            }
            Self::In { column, values } => {
                let _ = write!(out, "{column} in (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push('?');
                    bindings.push(value.clone());
                }
                out.push(')');
            }
            Self::ContainsCi { column, needle } => {
                let _ = write!(out, "lower({column}) like ?");
                bindings.push(Value::Text(format!("%{}%", needle.to_lowercase())));
            }
            Self::Or(children) => {
                out.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" or ");
                    }
                    child.compile(out, bindings);
                }
                out.push(')');
            }
            Self::Exists {
                relation,
                predicate,
            } => {
                let _ = write!(out, "exists ({relation} where ");
                predicate.compile(out, bindings);
                out.push(')');
            }
        }
    }
}

///
/// TESTS
///
