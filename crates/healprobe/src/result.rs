//! Result and error types for Healprobe.

use thiserror::Error;

/// Result type for Healprobe operations
pub type HealResult<T> = Result<T, HealError>;

/// Errors that can occur in Healprobe
#[derive(Debug, Error)]
pub enum HealError {
    /// Element never appeared within the retry budget
    #[error("Element '{identifier}' not found after {attempts} attempts")]
    NotFound {
        /// Identifier that was searched for
        identifier: String,
        /// Number of polling cycles performed
        attempts: u32,
        /// Containers that could not be entered (cross-origin frames)
        inaccessible: Vec<String>,
    },

    /// A shadow root or frame document could not be entered
    #[error("Boundary '{container}' is not accessible: {reason}")]
    BoundaryInaccessible {
        /// Container description
        container: String,
        /// Why it could not be entered
        reason: String,
    },

    /// Node handle does not refer to a usable node
    #[error("Invalid node {node}: {message}")]
    InvalidNode {
        /// Debug rendering of the node handle
        node: String,
        /// Error message
        message: String,
    },

    /// DOM mutation rejected
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Error message
        message: String,
    },

    /// Fixture file could not be turned into a document
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Configuration rejected
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HealError {
    /// Create an invalid-operation error
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create a fixture error
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error is a resolution timeout
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_attempts() {
        let err = HealError::NotFound {
            identifier: "shadow-input-3".to_string(),
            attempts: 7,
            inaccessible: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "Element 'shadow-input-3' not found after 7 attempts"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_constructors() {
        assert!(matches!(
            HealError::config("bad"),
            HealError::Config { .. }
        ));
        assert!(HealError::fixture("x").to_string().contains("Fixture error"));
        assert!(!HealError::invalid_operation("x").is_not_found());
    }
}
