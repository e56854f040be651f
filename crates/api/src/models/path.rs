use serde::{Deserialize, Serialize};
use std::fmt;

/// The result of resolving an asset path.
///
/// The string is opaque to clients and meaningful only to the resolver that
/// produced it and the layer that opens assets. An empty path means the
/// asset could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedPath(String);

impl ResolvedPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The sentinel returned when resolution fails.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResolvedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResolvedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ResolvedPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for ResolvedPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResolvedPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
