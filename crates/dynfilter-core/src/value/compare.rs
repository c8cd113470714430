use crate::value::Value;
use std::cmp::Ordering;

impl Value {
    /// Stable rank used when comparing values of unrelated families.
    #[must_use]
    pub(crate) const fn canonical_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Uint(_) | Self::Float(_) => 2,
            Self::Text(_) => 3,
            Self::Date(_) => 4,
            Self::Timestamp(_) => 5,
            Self::Enum(_) => 6,
            Self::List(_) => 7,
            Self::Record(_) => 8,
        }
    }

    /// Canonical total ordering: by family rank, then within the family.
    ///
    /// Integers compare exactly across signedness; any float comparison
    /// widens to `f64` under `total_cmp`.
    #[must_use]
    pub fn canonical_cmp(left: &Self, right: &Self) -> Ordering {
        match (left, right) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Uint(a), Self::Uint(b)) => a.cmp(b),
            (Self::Int(a), Self::Uint(b)) => i128::from(*a).cmp(&i128::from(*b)),
            (Self::Uint(a), Self::Int(b)) => i128::from(*a).cmp(&i128::from(*b)),
            (Self::Float(_), _) | (_, Self::Float(_))
                if left.canonical_rank() == 2 && right.canonical_rank() == 2 =>
            {
                as_f64(left).total_cmp(&as_f64(right))
            }
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => Self::canonical_cmp(&a.tag, &b.tag),
            (Self::List(a), Self::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = Self::canonical_cmp(x, y);
                    if ord.is_ne() {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Self::Record(a), Self::Record(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.cmp(kb).then_with(|| Self::canonical_cmp(va, vb));
                    if ord.is_ne() {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => left.canonical_rank().cmp(&right.canonical_rank()),
        }
    }

    /// Equality under canonical ordering (`1` equals `1u64`, NaN equals NaN).
    #[must_use]
    pub fn canonical_eq(left: &Self, right: &Self) -> bool {
        Self::canonical_cmp(left, right).is_eq()
    }

    /// Equality as a loosely-typed store would apply it to submitted form
    /// values: canonical equality, or equal text projections when either
    /// side is text.
    #[must_use]
    pub fn loose_eq(left: &Self, right: &Self) -> bool {
        if Self::canonical_eq(left, right) {
            return true;
        }

        match (left, right) {
            (Self::Null, _) | (_, Self::Null) => false,
            (Self::Text(_), _) | (_, Self::Text(_)) => {
                left.text_projection() == right.text_projection()
            }
            _ => false,
        }
    }

    /// Case-insensitive substring match against the text projection.
    #[must_use]
    pub fn contains_ci(&self, needle: &str) -> bool {
        casefold(&self.text_projection()).contains(&casefold(needle))
    }
}

#[expect(clippy::cast_precision_loss)]
const fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(v) => *v as f64,
        Value::Uint(v) => *v as f64,
        Value::Float(v) => *v,
        _ => 0.0,
    }
}

pub(crate) fn casefold(input: &str) -> String {
    if input.is_ascii() {
        return input.to_ascii_lowercase();
    }

    input.to_lowercase()
}
