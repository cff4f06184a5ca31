//! Explicit per-entity field tables.
//!
//! Each typed entity declares an [`EntitySchema`]: the element it is stored
//! in, its tag prefix, and one [`FieldSpec`] per field mapping the Rust field
//! name to its external tag and value kind. The same table drives both
//! directions: [`EntitySchema::validate`] on the read side and
//! [`EntitySchema::tag_for`] on the write side.
//!
//! Entities are declared with the [`entity!`] macro, which generates the
//! struct, its schema table and its [`Entity`] impl from one field list.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::document::{Document, NodeId};
use crate::normalize::Scalar;
use crate::record::{Record, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Int,
    Float,
    Bool,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::Text => "string",
            FieldKind::Int => "integer",
            FieldKind::Float => "float",
            FieldKind::Bool => "boolean",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub tag: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug)]
pub struct EntitySchema {
    /// Human-readable kind, used in logs and errors.
    pub kind: &'static str,
    /// Element tag the entity is stored under.
    pub element: &'static str,
    /// Tag prefix shared by the entity's field tags.
    pub prefix: &'static str,
    /// Catalog file holding entities of this kind, if any.
    pub file: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field `{field}` ({tag})")]
    Missing {
        field: &'static str,
        tag: &'static str,
    },
    #[error("field `{field}` ({tag}) expects {expected}, found {found}")]
    WrongType {
        field: &'static str,
        tag: &'static str,
        expected: FieldKind,
        found: String,
    },
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The field carrying the entity's display name.
    pub fn name_tag(&self) -> &'static str {
        self.field("name").map(|f| f.tag).unwrap_or("NAME")
    }

    /// External tag for a field: the declared alias upper-cased, or the
    /// prefix joined with the upper-cased field name when none is declared.
    pub fn tag_for(&self, name: &str) -> String {
        match self.field(name) {
            Some(spec) => spec.tag.to_uppercase(),
            None => format!("{}{}", self.prefix, name.to_uppercase()),
        }
    }

    /// Check a record against the field table, coercing each present value
    /// to its declared kind. Unknown keys are ignored.
    pub fn validate(&self, record: &Record) -> Result<Fields, ValidationError> {
        let mut out = BTreeMap::new();
        for spec in self.fields {
            let key = spec.tag.to_lowercase();
            let coerced = match record.get(&key) {
                Some(value) => coerce(spec, value)?,
                None => None,
            };
            match coerced {
                Some(v) => {
                    out.insert(spec.name, v);
                }
                None if spec.required => {
                    return Err(ValidationError::Missing {
                        field: spec.name,
                        tag: spec.tag,
                    })
                }
                None => {}
            }
        }
        Ok(Fields(out))
    }
}

/// Coerce one record value. `Ok(None)` means "absent": an empty numeric or
/// boolean field, which falls back to the default.
fn coerce(spec: &FieldSpec, value: &Value) -> Result<Option<FieldValue>, ValidationError> {
    let wrong = || ValidationError::WrongType {
        field: spec.name,
        tag: spec.tag,
        expected: spec.kind,
        found: value.type_name().to_string(),
    };

    let (scalar, raw) = match value {
        Value::Leaf(leaf) => (&leaf.scalar, leaf.raw.as_str()),
        Value::Record(_) => return Err(wrong()),
    };
    if raw.is_empty() {
        return Ok(match spec.kind {
            FieldKind::Text if !spec.required => Some(FieldValue::Text(String::new())),
            _ => None,
        });
    }

    let coerced = match (spec.kind, scalar) {
        (FieldKind::Text, _) => FieldValue::Text(raw.to_string()),

        (FieldKind::Int, Scalar::Int(i)) => FieldValue::Int(*i),
        (FieldKind::Int, Scalar::Float(f)) if f.is_finite() && f.fract() == 0.0 => {
            FieldValue::Int(*f as i64)
        }
        (FieldKind::Int, Scalar::Text(s)) => FieldValue::Int(s.trim().parse().map_err(|_| wrong())?),

        (FieldKind::Float, Scalar::Int(i)) => FieldValue::Float(*i as f64),
        (FieldKind::Float, Scalar::Float(f)) => FieldValue::Float(*f),
        (FieldKind::Float, Scalar::Text(s)) => {
            FieldValue::Float(s.trim().parse().map_err(|_| wrong())?)
        }

        (FieldKind::Bool, Scalar::Int(i)) => FieldValue::Bool(*i != 0),
        (FieldKind::Bool, Scalar::Float(f)) => FieldValue::Bool(*f != 0.0),
        (FieldKind::Bool, Scalar::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => FieldValue::Bool(true),
            "false" | "no" => FieldValue::Bool(false),
            _ => return Err(wrong()),
        },

        _ => return Err(wrong()),
    };
    Ok(Some(coerced))
}

/// A typed field value, already coerced to its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    /// Parse user input as a value of the given kind. Booleans accept
    /// `1/0`, `true/false` and `yes/no`.
    pub fn parse(kind: FieldKind, raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        match kind {
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::Int => trimmed.parse().ok().map(FieldValue::Int),
            FieldKind::Float => trimmed.parse().ok().map(FieldValue::Float),
            FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(FieldValue::Bool(true)),
                "0" | "false" | "no" => Some(FieldValue::Bool(false)),
                _ => None,
            },
        }
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

pub trait FromField: Default {
    fn from_field(value: FieldValue) -> Option<Self>;
}

impl FromField for String {
    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FromField for i64 {
    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int(i) => Some(i),
            _ => None,
        }
    }
}

impl FromField for f64 {
    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl FromField for bool {
    fn from_field(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

/// Validated field values keyed by Rust field name.
#[derive(Debug, Default)]
pub struct Fields(BTreeMap<&'static str, FieldValue>);

impl Fields {
    /// Take a field's value, or its type's default when absent.
    pub fn take<T: FromField>(&mut self, name: &str) -> T {
        self.0
            .remove(name)
            .and_then(T::from_field)
            .unwrap_or_default()
    }
}

/// A typed entity backed by an [`EntitySchema`].
pub trait Entity: Sized + Clone {
    const SCHEMA: &'static EntitySchema;

    fn from_fields(fields: Fields) -> Self;

    /// Field values in schema order, for fragment rendering.
    fn field_values(&self) -> Vec<(&'static FieldSpec, FieldValue)>;

    fn name(&self) -> &str;

    /// Fill owned sub-entities from the element's subtree. Runs after the
    /// entity's own fields validated; failures inside are logged, never fatal.
    fn hydrate(&mut self, _doc: &Document, _id: NodeId) {}

    fn from_record(record: &Record) -> Result<Self, ValidationError> {
        Self::SCHEMA.validate(record).map(Self::from_fields)
    }
}

macro_rules! field_type {
    (Text) => { String };
    (Int) => { i64 };
    (Float) => { f64 };
    (Bool) => { bool };
}

/// Declare a typed entity and its field table.
///
/// ```ignore
/// entity! {
///     #[entity(kind = "hop", element = "Hops", prefix = "F_H_", file = "Hops.bsmx")]
///     /// A hop variety.
///     pub struct Hop {
///         name: Text = "F_H_NAME" [required];
///         alpha: Float = "F_H_ALPHA";
///     }
/// }
/// ```
macro_rules! entity {
    (@required required) => { true };
    (@required) => { false };
    (@file $file:literal) => { Some($file) };
    (@file) => { None };
    (@hydrate $this:ident, $doc:ident, $id:ident, $hydrate:ident) => { $hydrate($this, $doc, $id) };
    (@hydrate $this:ident, $doc:ident, $id:ident,) => { let _ = ($this, $doc, $id); };

    (
        #[entity(kind = $kind:literal, element = $element:literal, prefix = $prefix:literal
            $(, file = $file:literal)? $(, hydrate = $hydrate:ident)?)]
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $fkind:ident = $tag:literal $([$req:ident])? ;
            )*
        }
        $(owns {
            $( $(#[$ometa:meta])* $ofield:ident : $oty:ty ),* $(,)?
        })?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: field_type!($fkind), )*
            $($( $(#[$ometa])* pub $ofield: $oty, )*)?
        }

        impl $crate::schema::Entity for $name {
            const SCHEMA: &'static $crate::schema::EntitySchema = &$crate::schema::EntitySchema {
                kind: $kind,
                element: $element,
                prefix: $prefix,
                file: entity!(@file $($file)?),
                fields: &[
                    $(
                        $crate::schema::FieldSpec {
                            name: stringify!($field),
                            tag: $tag,
                            kind: $crate::schema::FieldKind::$fkind,
                            required: entity!(@required $($req)?),
                        },
                    )*
                ],
            };

            #[allow(clippy::needless_update)]
            fn from_fields(mut fields: $crate::schema::Fields) -> Self {
                Self {
                    $( $field: fields.take(stringify!($field)), )*
                    ..Default::default()
                }
            }

            fn field_values(
                &self,
            ) -> Vec<(&'static $crate::schema::FieldSpec, $crate::schema::FieldValue)> {
                Self::SCHEMA
                    .fields
                    .iter()
                    .zip([
                        $( $crate::schema::FieldValue::from(self.$field.clone()), )*
                    ])
                    .collect()
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn hydrate(&mut self, doc: &$crate::document::Document, id: $crate::document::NodeId) {
                entity!(@hydrate self, doc, id, $($hydrate)?);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::record::to_record;

    entity! {
        #[entity(kind = "widget", element = "Widget", prefix = "F_W_")]
        pub struct Widget {
            name: Text = "F_W_NAME" [required];
            count: Int = "F_W_COUNT";
            weight: Float = "F_W_WEIGHT";
            active: Bool = "F_W_ACTIVE";
            code: Text = "F_W_CODE";
        }
    }

    fn record_of(xml: &str) -> Record {
        let doc = Document::parse(xml).unwrap();
        to_record(&doc, doc.root().unwrap())
    }

    #[test]
    fn test_validate_and_coerce() {
        let r = record_of(
            "<Widget><F_W_NAME>Gear</F_W_NAME><F_W_COUNT>3.0</F_W_COUNT><F_W_WEIGHT>2</F_W_WEIGHT>\
             <F_W_ACTIVE>1</F_W_ACTIVE><F_W_CODE>1056</F_W_CODE></Widget>",
        );
        let w = Widget::from_record(&r).unwrap();
        assert_eq!(w.name, "Gear");
        assert_eq!(w.count, 3);
        assert_eq!(w.weight, 2.0);
        assert!(w.active);
        assert_eq!(w.code, "1056");
    }

    #[test]
    fn test_text_fields_keep_stored_digits() {
        let r = record_of(
            "<Widget><F_W_NAME>Infinity</F_W_NAME><F_W_CODE>007</F_W_CODE></Widget>",
        );
        let w = Widget::from_record(&r).unwrap();
        assert_eq!(w.name, "Infinity");
        assert_eq!(w.code, "007");

        let r = record_of("<Widget><F_W_NAME>1.50</F_W_NAME><F_W_CODE> 12 </F_W_CODE></Widget>");
        let w = Widget::from_record(&r).unwrap();
        assert_eq!(w.name, "1.50");
        assert_eq!(w.code, " 12 ");
    }

    #[test]
    fn test_missing_required_field() {
        let r = record_of("<Widget><F_W_COUNT>3</F_W_COUNT></Widget>");
        let err = Widget::from_record(&r).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Missing {
                field: "name",
                tag: "F_W_NAME"
            }
        );
    }

    #[test]
    fn test_wrong_type_rejected() {
        let r = record_of("<Widget><F_W_NAME>Gear</F_W_NAME><F_W_WEIGHT>heavy</F_W_WEIGHT></Widget>");
        assert!(matches!(
            Widget::from_record(&r),
            Err(ValidationError::WrongType { field: "weight", .. })
        ));

        let nested =
            record_of("<Widget><F_W_NAME><X>1</X></F_W_NAME></Widget>");
        assert!(matches!(
            Widget::from_record(&nested),
            Err(ValidationError::WrongType { field: "name", .. })
        ));
    }

    #[test]
    fn test_fractional_float_rejected_for_int() {
        let r = record_of("<Widget><F_W_NAME>Gear</F_W_NAME><F_W_COUNT>2.5</F_W_COUNT></Widget>");
        assert!(Widget::from_record(&r).is_err());
    }

    #[test]
    fn test_empty_numeric_defaults() {
        let r = record_of("<Widget><F_W_NAME>Gear</F_W_NAME><F_W_COUNT></F_W_COUNT></Widget>");
        let w = Widget::from_record(&r).unwrap();
        assert_eq!(w.count, 0);
    }

    #[test]
    fn test_empty_required_text_is_missing() {
        let r = record_of("<Widget><F_W_NAME></F_W_NAME></Widget>");
        assert!(matches!(
            Widget::from_record(&r),
            Err(ValidationError::Missing { field: "name", .. })
        ));
    }

    #[test]
    fn test_tag_for_alias_and_fallback() {
        let schema = Widget::SCHEMA;
        assert_eq!(schema.tag_for("weight"), "F_W_WEIGHT");
        assert_eq!(schema.tag_for("color"), "F_W_COLOR");
        assert_eq!(schema.name_tag(), "F_W_NAME");
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!(FieldValue::parse(FieldKind::Int, " 7 "), Some(FieldValue::Int(7)));
        assert_eq!(FieldValue::parse(FieldKind::Float, "6.2"), Some(FieldValue::Float(6.2)));
        assert_eq!(FieldValue::parse(FieldKind::Bool, "Yes"), Some(FieldValue::Bool(true)));
        assert_eq!(FieldValue::parse(FieldKind::Bool, "maybe"), None);
        assert_eq!(FieldValue::parse(FieldKind::Int, "six"), None);
    }

    #[test]
    fn test_field_values_in_schema_order() {
        let w = Widget {
            name: "Gear".into(),
            count: 2,
            ..Default::default()
        };
        let values = w.field_values();
        assert_eq!(values.len(), 5);
        assert_eq!(values[0].0.tag, "F_W_NAME");
        assert_eq!(values[0].1, FieldValue::Text("Gear".into()));
        assert_eq!(values[1].1, FieldValue::Int(2));
    }
}
