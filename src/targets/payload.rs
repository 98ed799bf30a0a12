//! Client → server revalidation payload.
//!
//! The client sends back the `[id, props]` half of entries it received in a
//! render table: `[[id, props], ...]`. The instance name travels inside
//! `props.name`, and the response pairs markup with requests by position.

use serde::{Deserialize, Serialize};

use crate::domain::Invocation;

use super::error::ParseError;

/// Ordered list of invocations the client wants re-rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevalidationPayload {
    entries: Vec<Invocation>,
}

impl RevalidationPayload {
    pub fn new(entries: Vec<Invocation>) -> Self {
        Self { entries }
    }

    /// Decode a payload. Invalid JSON or any shape mismatch rejects the whole payload.
    pub fn parse(payload: &str) -> Result<Self, ParseError> {
        serde_json::from_str(payload).map_err(ParseError::Json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn entries(&self) -> &[Invocation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for RevalidationPayload {
    type Item = Invocation;
    type IntoIter = std::vec::IntoIter<Invocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Free-function form of [`RevalidationPayload::parse`].
pub fn parse_revalidation_payload(payload: &str) -> Result<RevalidationPayload, ParseError> {
    RevalidationPayload::parse(payload)
}
