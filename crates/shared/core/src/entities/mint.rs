use serde::{Deserialize, Serialize};

/// Unique identifier for a token (its mint address)
///
/// Used as the primary key of the token set and as the subscription key on
/// the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MintId(pub String);

impl MintId {
    /// Create a new mint ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MintId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MintId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for MintId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
