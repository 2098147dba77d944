//! Domain primitive types used across the stackweave workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StackweaveError};

/// Fully qualified location of a resource or construct in the composition tree.
///
/// Addresses are construct paths joined with `/`, ending in the node's
/// logical id (`acme/dev/project/project`). They are unique across a stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Path separator between construct segments.
    pub const SEPARATOR: char = '/';

    /// Creates an address from its string form without validation.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Creates the address of a root construct.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a valid logical id.
    pub fn root(name: &str) -> Result<Self> {
        validate_logical_id(name)?;
        Ok(Self(name.to_string()))
    }

    /// Returns the address of a direct child named `id`.
    #[must_use]
    pub fn child(&self, id: &str) -> Self {
        Self(format!("{}{}{id}", self.0, Self::SEPARATOR))
    }

    /// Returns the enclosing construct address, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once(Self::SEPARATOR)
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// Returns the last path segment.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        self.0
            .rsplit_once(Self::SEPARATOR)
            .map_or(self.0.as_str(), |(_, id)| id)
    }

    /// Returns `true` if this address equals `ancestor` or lies beneath it.
    #[must_use]
    pub fn is_within(&self, ancestor: &Self) -> bool {
        self.0 == ancestor.0
            || (self.0.starts_with(&ancestor.0)
                && self.0[ancestor.0.len()..].starts_with(Self::SEPARATOR))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// External resource type understood by the provisioning engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKind(String);

impl ResourceKind {
    /// Creates a resource kind from its engine-facing name.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// Checks that `id` can be used as a single address segment.
///
/// # Errors
///
/// Returns a configuration error if the id is empty, contains the address
/// separator, or contains whitespace.
pub fn validate_logical_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(StackweaveError::configuration(
            "id",
            "logical id must not be empty",
        ));
    }
    if id.contains(Address::SEPARATOR) || id.chars().any(char::is_whitespace) {
        return Err(StackweaveError::configuration(
            "id",
            format!("logical id \"{id}\" must not contain '/' or whitespace"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_and_parent_are_inverse() {
        let root = Address::root("acme").expect("root");
        let child = root.child("project");
        assert_eq!(child.as_str(), "acme/project");
        assert_eq!(child.parent(), Some(root));
        assert_eq!(child.logical_id(), "project");
    }

    #[test]
    fn root_has_no_parent() {
        let root = Address::new("acme");
        assert!(root.parent().is_none());
        assert_eq!(root.logical_id(), "acme");
    }

    #[test]
    fn is_within_respects_segment_boundaries() {
        let env = Address::new("acme/dev");
        assert!(Address::new("acme/dev/project").is_within(&env));
        assert!(env.is_within(&env));
        assert!(!Address::new("acme/develop").is_within(&env));
    }

    #[test]
    fn logical_id_rejects_separator_and_blank() {
        assert!(validate_logical_id("a/b").is_err());
        assert!(validate_logical_id("").is_err());
        assert!(validate_logical_id("has space").is_err());
        assert!(validate_logical_id("api-run.googleapis.com").is_ok());
    }

    #[test]
    fn address_serializes_as_plain_string() {
        let json = serde_json::to_string(&Address::new("acme/sa")).expect("serialize");
        assert_eq!(json, "\"acme/sa\"");
    }
}
