//! Element-to-record mapping.
//!
//! A [`Record`] is the untyped view of one element: lower-cased child tag
//! names mapped to normalized scalars or nested records. The mapping is
//! purely structural and knows nothing about entity types; validation
//! against a schema happens in [`crate::schema`].

use std::collections::BTreeMap;

use crate::document::{Document, NodeId};
use crate::entities;
use crate::normalize::{normalize, Scalar};

/// A leaf's normalized scalar plus the decoded text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub scalar: Scalar,
    pub raw: String,
}

impl Leaf {
    pub fn new(raw: &str) -> Self {
        Leaf {
            scalar: normalize(raw),
            raw: raw.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Leaf(Leaf),
    Record(Record),
}

impl Value {
    pub fn scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Leaf(leaf) => Some(&leaf.scalar),
            Value::Record(_) => None,
        }
    }

    /// Decoded leaf text exactly as stored, before normalization.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Value::Leaf(leaf) => Some(&leaf.raw),
            Value::Record(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self.scalar() {
            Some(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Short description of the value's shape, for validation messages.
    pub fn type_name(&self) -> &'static str {
        match self.scalar() {
            Some(Scalar::Int(_)) => "integer",
            Some(Scalar::Float(_)) => "float",
            Some(Scalar::Text(_)) => "string",
            None => "nested record",
        }
    }
}

pub type Record = BTreeMap<String, Value>;

/// Map an element's direct children into a record, recursing into children
/// that have children of their own. Later duplicates of a tag overwrite
/// earlier ones.
pub fn to_record(doc: &Document, id: NodeId) -> Record {
    let mut record = Record::new();
    for &child in doc.children(id) {
        let key = doc.tag(child).to_lowercase();
        let value = if doc.children(child).is_empty() {
            let text = doc.text(child).unwrap_or("");
            Value::Leaf(Leaf::new(&entities::decode_html(text)))
        } else {
            Value::Record(to_record(doc, child))
        };
        record.insert(key, value);
    }
    record
}

/// Best-effort display name for a record that failed validation.
pub fn label(record: &Record, name_key: &str) -> String {
    let scalar_name = |v: &Value| match v.raw() {
        Some(raw) if !raw.is_empty() => Some(raw.to_string()),
        _ => None,
    };
    record
        .get(name_key)
        .and_then(scalar_name)
        .or_else(|| {
            record
                .iter()
                .filter(|(k, _)| k.ends_with("_name"))
                .find_map(|(_, v)| scalar_name(v))
        })
        .unwrap_or_else(|| "unknown".to_string())
}
