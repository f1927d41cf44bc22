use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::ObjectRef;
use crate::constants::ELEMENT_KEY_FIELD;

/// Attributes of one cached object, keyed by the property path the change
/// feed reported them under (`name`, `config.hardware.device`, ...)
pub type PropertyBag = BTreeMap<String, PropertyValue>;

/// A cached property value.
///
/// Values are scalars, records addressed by field name, or ordered sequences.
/// Sequence elements are usually records carrying a synthetic `key` field
/// which bracketed path segments (`device["4000"]`) select on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Reference(ObjectRef),
    Record(BTreeMap<String, PropertyValue>),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Build a record from `(field, value)` pairs
    pub fn record<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        PropertyValue::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn list(items: impl IntoIterator<Item = PropertyValue>) -> Self {
        PropertyValue::List(items.into_iter().collect())
    }

    /// Textual form of this value when used as an element key
    pub fn key_text(&self) -> Option<String> {
        match self {
            PropertyValue::String(s) => Some(s.clone()),
            PropertyValue::Int(i) => Some(i.to_string()),
            PropertyValue::Bool(b) => Some(b.to_string()),
            PropertyValue::Reference(r) => Some(r.to_string()),
            _ => None,
        }
    }

    /// Synthetic element key of a sequence element, if it has one
    pub fn element_key(&self) -> Option<String> {
        match self {
            PropertyValue::Record(fields) => fields.get(ELEMENT_KEY_FIELD).and_then(PropertyValue::key_text),
            _ => None,
        }
    }

    pub fn has_element_key(
        &self,
        key: &str,
    ) -> bool {
        self.element_key().as_deref() == Some(key)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn get(
        &self,
        field: &str,
    ) -> Option<&PropertyValue> {
        match self {
            PropertyValue::Record(fields) => fields.get(field),
            _ => None,
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::String(_) => "string",
            PropertyValue::Reference(_) => "reference",
            PropertyValue::Record(_) => "record",
            PropertyValue::List(_) => "list",
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<ObjectRef> for PropertyValue {
    fn from(v: ObjectRef) -> Self {
        PropertyValue::Reference(v)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(v: Vec<PropertyValue>) -> Self {
        PropertyValue::List(v)
    }
}
