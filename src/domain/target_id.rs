//! Content-addressed identifiers for fragment-producing functions.
//!
//! An id is the lowercase hex SHA-1 digest of `"<module_path>:<name>"`. It
//! depends on nothing but those two strings, so a revalidation payload issued
//! by one server process stays valid against any later process built from the
//! same source.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Opaque identifier of a registered target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Derive the identifier for the function `name` declared in `module_path`.
    pub fn derive(module_path: &str, name: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(module_path.as_bytes());
        hasher.update(b":");
        hasher.update(name.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an identifier that was assigned by hand or received from a client.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TargetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Derive the [`TargetId`] of a Rust fragment declared in the calling module.
///
/// ```ignore
/// let id = retarget::target_id!("Header");
/// ```
#[macro_export]
macro_rules! target_id {
    ($name:expr) => {
        $crate::domain::TargetId::derive(::core::module_path!(), $name)
    };
}
