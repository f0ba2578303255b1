use serde_json::Value;

use crate::errors::ServiceError;
use crate::record::Payload;

/// Name of a resource collection and the fields every record of it must carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSchema {
    pub name: String,
    pub required_fields: Vec<String>,
}

impl ResourceSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), required_fields: Vec::new() }
    }

    pub fn require<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Every required field must be present, non-null and, for strings, non-blank.
    pub fn validate(&self, fields: &Payload) -> Result<(), ServiceError> {
        for name in &self.required_fields {
            match fields.get(name) {
                None | Some(Value::Null) => {
                    return Err(ServiceError::invalid(format!("{}: missing required field `{}`", self.name, name)))
                }
                Some(Value::String(s)) if s.trim().is_empty() => {
                    return Err(ServiceError::invalid(format!("{}: field `{}` must not be empty", self.name, name)))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
