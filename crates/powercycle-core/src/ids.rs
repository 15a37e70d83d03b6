//! Resource identifier type.
//!
//! The identifier is assigned by the control plane (for example an instance
//! id such as `i-0123456789abcdef0`). It is opaque to powercycle and never
//! changes for the lifetime of the resource.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted identifier length in bytes.
const MAX_LEN: usize = 255;

/// Identifier of the managed compute resource.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Create a `ResourceId`, validating its shape.
    ///
    /// The identifier is trimmed; it must be non-empty, at most 255 bytes
    /// and must not contain whitespace or `/` (it is embedded in URL paths).
    ///
    /// # Errors
    ///
    /// Returns an [`IdError`] describing the first violated rule.
    pub fn new(value: impl AsRef<str>) -> Result<Self, IdError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(IdError::Empty);
        }
        if value.len() > MAX_LEN {
            return Err(IdError::TooLong {
                max: MAX_LEN,
                got: value.len(),
            });
        }
        if let Some(c) = value.chars().find(|c| c.is_whitespace() || *c == '/') {
            return Err(IdError::InvalidCharacter(c));
        }
        Ok(Self(value.to_string()))
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is empty or only whitespace.
    #[error("identifier is empty")]
    Empty,

    /// The identifier exceeds the maximum length.
    #[error("identifier too long: max {max} bytes, got {got}")]
    TooLong {
        /// The maximum number of bytes.
        max: usize,
        /// The actual number of bytes.
        got: usize,
    },

    /// The identifier contains a character that cannot appear in a path segment.
    #[error("identifier contains invalid character {0:?}")]
    InvalidCharacter(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_trims_input() {
        let id = ResourceId::new("  i-0abc  ").unwrap();
        assert_eq!(id.as_str(), "i-0abc");
        assert_eq!(id.to_string(), "i-0abc");
    }

    #[test]
    fn resource_id_empty() {
        assert_eq!(ResourceId::new("   "), Err(IdError::Empty));
    }

    #[test]
    fn resource_id_too_long() {
        let long = "x".repeat(300);
        assert!(matches!(
            ResourceId::new(&long),
            Err(IdError::TooLong { max: 255, got: 300 })
        ));
    }

    #[test]
    fn resource_id_rejects_path_separator() {
        assert_eq!(
            ResourceId::new("i-1/../admin"),
            Err(IdError::InvalidCharacter('/'))
        );
        assert_eq!(
            ResourceId::new("i-1 i-2"),
            Err(IdError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn resource_id_serde_json() {
        let id = ResourceId::new("i-0123456789abcdef0").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"i-0123456789abcdef0\"");

        let parsed: ResourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        assert!(serde_json::from_str::<ResourceId>("\"\"").is_err());
    }

    #[test]
    fn resource_id_debug() {
        let id: ResourceId = "i-42".parse().unwrap();
        assert_eq!(format!("{id:?}"), "ResourceId(i-42)");
    }
}
