//! Props handed to a target, and the instance name they carry.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DomainError;

/// Field of [`Props`] holding the instance name.
pub const NAME_FIELD: &str = "name";

/// Caller-chosen name of one rendered instance; unique within a render pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetName(String);

impl TargetName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TargetName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TargetName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Open mapping of field name to JSON value, guaranteed to carry a string `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Props {
    fields: Map<String, Value>,
}

impl Props {
    /// Build props for the instance `name`, with no other fields.
    pub fn named(name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(NAME_FIELD.to_string(), Value::String(name.into()));
        Self { fields }
    }

    /// Add or replace a field.
    ///
    /// A non-string value for `name` is ignored and the instance name is kept;
    /// use [`Props::try_with`] to get an error instead.
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == NAME_FIELD && !value.is_string() {
            return self;
        }
        self.insert(key, value)
    }

    /// Add or replace a field, failing when `name` would stop being a string.
    pub fn try_with(
        self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, DomainError> {
        let key = key.into();
        let value = value.into();
        if key == NAME_FIELD && !value.is_string() {
            return Err(DomainError::validation(format!(
                "`{NAME_FIELD}` must be a string, got {value}"
            )));
        }
        Ok(self.insert(key, value))
    }

    fn insert(mut self, key: String, value: Value) -> Self {
        self.fields.insert(key, value);
        self
    }

    pub fn name(&self) -> TargetName {
        TargetName(self.name_str().to_string())
    }

    fn name_str(&self) -> &str {
        self.fields
            .get(NAME_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String field lookup; `None` when missing or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for Props {
    type Error = DomainError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        match fields.get(NAME_FIELD) {
            Some(Value::String(_)) => Ok(Self { fields }),
            Some(other) => Err(DomainError::validation(format!(
                "props field `{NAME_FIELD}` must be a string, found {other}"
            ))),
            None => Err(DomainError::validation(format!(
                "props are missing the `{NAME_FIELD}` field"
            ))),
        }
    }
}

impl TryFrom<Value> for Props {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Self::try_from(fields),
            other => Err(DomainError::validation(format!(
                "props must be a JSON object, found {other}"
            ))),
        }
    }
}

impl From<Props> for Map<String, Value> {
    fn from(props: Props) -> Self {
        props.fields
    }
}
