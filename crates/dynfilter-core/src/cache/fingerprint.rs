use crate::{query::Queryable, value::Value};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write as _};

/// Fingerprint format version byte, fed first into every digest.
pub(crate) const FINGERPRINT_VERSION: u8 = 1;

///
/// Fingerprint
///
/// Leading 128 bits of the SHA-256 digest of a query's compiled predicate
/// text and bound parameters. Renders as 32 lowercase hex characters.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(32);
        for byte in self.0 {
            let _ = write!(out, "{byte:02x}");
        }
        f.write_str(&out)
    }
}

/// Compute the fingerprint of a query's compiled shape.
///
/// Pure: identical compiled text and bindings always yield identical
/// fingerprints, independent of the query instance.
#[must_use]
pub fn fingerprint_query<Q: Queryable>(query: &Q) -> Fingerprint {
    fingerprint_parts(&query.compiled_predicate_text(), &query.bound_parameters())
}

/// Fingerprint raw compiled text plus bindings.
#[must_use]
pub fn fingerprint_parts(compiled: &str, bindings: &[Value]) -> Fingerprint {
    let mut hasher = Sha256::new();

    write_tag(&mut hasher, FINGERPRINT_VERSION);
    write_str(&mut hasher, compiled);
    write_len_u32(&mut hasher, bindings.len());
    for value in bindings {
        write_value(&mut hasher, value);
    }

    let digest = hasher.finalize();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);

    Fingerprint(out)
}

// Canonical tagged encoding: distinct values never share a byte stream.
fn write_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => write_tag(hasher, 0x00),
        Value::Bool(b) => {
            write_tag(hasher, 0x01);
            write_tag(hasher, u8::from(*b));
        }
        Value::Int(v) => {
            write_tag(hasher, 0x02);
            hasher.update(v.to_be_bytes());
        }
        Value::Uint(v) => {
            write_tag(hasher, 0x03);
            hasher.update(v.to_be_bytes());
        }
        Value::Float(v) => {
            write_tag(hasher, 0x04);
            hasher.update(v.to_bits().to_be_bytes());
        }
        Value::Text(text) => {
            write_tag(hasher, 0x05);
            write_str(hasher, text);
        }
        Value::Date(d) => {
            write_tag(hasher, 0x06);
            write_str(hasher, &d.to_iso());
        }
        Value::Timestamp(ts) => {
            write_tag(hasher, 0x07);
            write_str(hasher, &ts.to_iso());
        }
        Value::Enum(e) => {
            write_tag(hasher, 0x08);
            write_value(hasher, &e.tag);
        }
        Value::List(items) => {
            write_tag(hasher, 0x09);
            write_len_u32(hasher, items.len());
            for item in items {
                write_value(hasher, item);
            }
        }
        Value::Record(record) => {
            write_tag(hasher, 0x0a);
            write_len_u32(hasher, record.len());
            for (field, value) in record.iter() {
                write_str(hasher, field);
                write_value(hasher, value);
            }
        }
    }
}

fn write_str(hasher: &mut Sha256, value: &str) {
    write_len_u32(hasher, value.len());
    hasher.update(value.as_bytes());
}

/// Encode a platform-sized length as u32 with deterministic saturation.
fn write_len_u32(hasher: &mut Sha256, len: usize) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    hasher.update(len.to_be_bytes());
}

fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}

///
/// TESTS
///
