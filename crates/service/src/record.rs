//! Record model shared by the store and its persistence providers.
//!
//! A record is an identifier plus an open set of JSON fields, serialized flat:
//! `{"id": "a1", "name": "Widget", "qty": 5}`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// Open set of domain fields carried by create/update requests and stored records.
pub type Payload = Map<String, Value>;

const MAX_ID_LEN: usize = 128;

/// Identifier of a record. Always non-empty; numeric ids are kept in decimal form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Validate a caller-supplied identifier.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        if raw.trim().is_empty() {
            return Err(ServiceError::invalid("id must not be empty"));
        }
        if raw.len() > MAX_ID_LEN {
            return Err(ServiceError::invalid(format!("id longer than {} bytes", MAX_ID_LEN)));
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control() || c == '/') {
            return Err(ServiceError::invalid(format!("malformed id {:?}", raw)));
        }
        Ok(Self(raw.to_string()))
    }

    /// Read an id out of a JSON value: strings and integers are accepted.
    pub fn from_json(value: &Value) -> Result<Self, ServiceError> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::parse(&n.to_string()),
            other => Err(ServiceError::invalid(format!("id must be a string or integer, got {}", other))),
        }
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<uuid::Uuid> for RecordId {
    fn from(u: uuid::Uuid) -> Self { Self(u.simple().to_string()) }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RecordId::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// A stored domain object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: Payload,
}

impl Record {
    pub fn new(id: RecordId, fields: Payload) -> Self { Self { id, fields } }

    pub fn field(&self, name: &str) -> Option<&Value> { self.fields.get(name) }

    /// Shallow merge: top-level keys of `patch` overwrite existing ones. `id` is never touched.
    pub fn merge(&mut self, patch: Payload) {
        for (k, v) in patch {
            if k != "id" {
                self.fields.insert(k, v);
            }
        }
    }
}

/// Turn an arbitrary JSON value into a payload, rejecting non-objects.
pub fn payload_from_value(value: Value) -> Result<Payload, ServiceError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ServiceError::invalid(format!("payload must be a JSON object, got {}", type_name(&other)))),
    }
}

/// Remove and validate an `id` key carried inside a payload.
pub fn take_id(payload: &mut Payload) -> Result<Option<RecordId>, ServiceError> {
    match payload.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => RecordId::from_json(&v).map(Some),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Equality filter on a single field, used by `list`.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), value: value.into() }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.field == "id" {
            return match &self.value {
                Value::String(s) => s == record.id.as_str(),
                Value::Number(n) => n.to_string() == record.id.as_str(),
                _ => false,
            };
        }
        let Some(actual) = record.field(&self.field) else { return false };
        if actual == &self.value {
            return true;
        }
        // query strings only carry text; let "5" match 5 and "true" match true
        match (&self.value, actual) {
            (Value::String(s), Value::Number(n)) => &n.to_string() == s,
            (Value::String(s), Value::Bool(b)) => &b.to_string() == s,
            _ => false,
        }
    }
}
