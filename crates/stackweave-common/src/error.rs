//! Unified error types for the stackweave workspace.
//!
//! Every composition failure is fail-fast: a pass that returns one of these
//! errors leaves no partially usable graph behind, and the caller recomposes
//! from scratch after fixing the declaration.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Address;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackweaveError {
    /// A construct input is missing, malformed, or violates a precondition.
    #[error("invalid configuration for `{field}`: {message}")]
    Configuration {
        /// Name of the offending configuration field.
        field: String,
        /// Description of the violated precondition.
        message: String,
    },

    /// The finalized graph contains a cycle.
    #[error("cyclic dependency detected: {}", format_cycle(.cycle))]
    CyclicDependency {
        /// Addresses on the cycle, in edge order. The first node is not repeated.
        cycle: Vec<Address>,
    },

    /// Two children of the same construct share a logical id.
    #[error("duplicate identifier \"{id}\" in {scope}")]
    DuplicateIdentifier {
        /// Construct in which the collision happened.
        scope: Address,
        /// The colliding logical id.
        id: String,
    },

    /// An edge or reference names an address that was never declared.
    #[error("{to} depends on undeclared address {missing}")]
    DanglingReference {
        /// The endpoint that is neither a declared resource nor a construct.
        missing: Address,
        /// Producer side of the offending edge.
        from: Address,
        /// Consumer side of the offending edge.
        to: Address,
    },

    /// A deferred reference has no materialized value yet.
    #[error("unresolved reference to {address}.{attribute}")]
    Unresolved {
        /// Producer address.
        address: Address,
        /// Requested output attribute.
        attribute: String,
    },

    /// A template could not be rendered.
    #[error("template error: {message}")]
    Template {
        /// Description of the rendering failure.
        message: String,
    },

    /// Reading or writing a stack file, template or manifest failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl StackweaveError {
    /// Shorthand for a [`StackweaveError::Configuration`] error.
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`StackweaveError::Io`] error at `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reads a UTF-8 file, reporting failures with the offending path.
///
/// # Errors
///
/// Returns [`StackweaveError::Io`] if the file cannot be read.
pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| StackweaveError::io(path, e))
}

/// Writes `content` to `path`, reporting failures with the offending path.
///
/// # Errors
///
/// Returns [`StackweaveError::Io`] if the file cannot be written.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| StackweaveError::io(path, e))
}

fn format_cycle(cycle: &[Address]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(Address::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackweaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_closes_the_loop() {
        let err = StackweaveError::CyclicDependency {
            cycle: vec![Address::new("app/a"), Address::new("app/b")],
        };
        assert_eq!(
            err.to_string(),
            "cyclic dependency detected: app/a -> app/b -> app/a"
        );
    }

    #[test]
    fn configuration_message_names_field() {
        let err = StackweaveError::configuration("environment", "missing");
        assert_eq!(
            err.to_string(),
            "invalid configuration for `environment`: missing"
        );
    }

    #[test]
    fn dangling_message_names_missing_endpoint() {
        let err = StackweaveError::DanglingReference {
            missing: Address::new("app/ghost"),
            from: Address::new("app/ghost"),
            to: Address::new("app/a"),
        };
        assert_eq!(err.to_string(), "app/a depends on undeclared address app/ghost");
    }

    #[test]
    fn read_file_reports_path() {
        let err = read_file(Path::new("/nonexistent/stack.yaml")).unwrap_err();
        assert!(matches!(err, StackweaveError::Io { ref path, .. } if path == Path::new("/nonexistent/stack.yaml")));
        assert!(err.to_string().starts_with("I/O error at /nonexistent/stack.yaml"));
    }

    #[test]
    fn duplicate_message_names_scope() {
        let err = StackweaveError::DuplicateIdentifier {
            scope: Address::new("app/net"),
            id: "vpc".into(),
        };
        assert!(err.to_string().contains("\"vpc\" in app/net"));
    }
}
