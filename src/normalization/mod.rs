//! Projection and typing of raw SWAPI records into table-shaped rows.
pub mod numeric;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SyncResult;
use crate::swapi::RawRecord;

pub use numeric::{coerce_numeric, parse_decimal_text, SENTINEL, UNKNOWN_MARKER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Passed through unchanged.
    Text,
    /// Coerced with [`coerce_numeric`].
    Numeric,
}

/// Ordered whitelist of columns to keep, with the coercion rule for each.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub fields: &'static [(&'static str, FieldKind)],
}

impl FieldSpec {
    pub const fn new(fields: &'static [(&'static str, FieldKind)]) -> Self {
        Self { fields }
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(c, _)| *c)
    }
}

pub const PEOPLE: FieldSpec = FieldSpec::new(&[
    ("name", FieldKind::Text),
    ("height", FieldKind::Numeric),
    ("mass", FieldKind::Numeric),
    ("hair_color", FieldKind::Text),
    ("skin_color", FieldKind::Text),
    ("eye_color", FieldKind::Text),
    ("birth_year", FieldKind::Text),
    ("gender", FieldKind::Text),
    ("homeworld", FieldKind::Text),
    ("url", FieldKind::Text),
    ("edited", FieldKind::Text),
]);

pub const PLANETS: FieldSpec = FieldSpec::new(&[
    ("name", FieldKind::Text),
    ("rotation_period", FieldKind::Numeric),
    ("orbital_period", FieldKind::Numeric),
    ("diameter", FieldKind::Numeric),
    ("climate", FieldKind::Text),
    ("gravity", FieldKind::Text),
    ("terrain", FieldKind::Text),
    ("surface_water", FieldKind::Numeric),
    ("population", FieldKind::Numeric),
    ("url", FieldKind::Text),
    ("edited", FieldKind::Text),
]);

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Null,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Null => Value::Null,
        }
    }
}

/// One row: exactly the whitelisted columns, in whitelist order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    fields: IndexMap<String, FieldValue>,
}

impl NormalizedRecord {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Back to the untyped shape, e.g. to feed a row through [`normalize`] again.
    pub fn to_raw(&self) -> RawRecord {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect()
    }
}

fn text_field(value: Option<&Value>) -> FieldValue {
    match value {
        None | Some(Value::Null) => FieldValue::Null,
        Some(Value::String(s)) => FieldValue::Text(s.clone()),
        Some(other) => FieldValue::Text(other.to_string()),
    }
}

pub fn normalize_record(raw: &RawRecord, spec: &FieldSpec) -> SyncResult<NormalizedRecord> {
    let mut fields = IndexMap::with_capacity(spec.fields.len());
    for (column, kind) in spec.fields {
        let value = raw.get(*column);
        let out = match kind {
            FieldKind::Text => text_field(value),
            FieldKind::Numeric => FieldValue::Number(coerce_numeric(column, value)?),
        };
        fields.insert((*column).to_string(), out);
    }
    Ok(NormalizedRecord { fields })
}

/// Project and coerce a whole collection; the first bad value aborts.
pub fn normalize(raw: &[RawRecord], spec: &FieldSpec) -> SyncResult<Vec<NormalizedRecord>> {
    raw.iter().map(|r| normalize_record(r, spec)).collect()
}
