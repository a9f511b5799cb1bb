//! Error types for destination store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in destination store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entity with the identifier exists.
    #[error("entity not found: {kind}#{id}")]
    NotFound {
        /// Entity kind.
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// An entity with the identifier already exists.
    #[error("entity already exists: {kind}#{id}")]
    AlreadyExists {
        /// Entity kind.
        kind: &'static str,
        /// Conflicting identifier.
        id: String,
    },

    /// The entity has no identifier and none could be generated.
    #[error("entity of kind {kind} has no identifier")]
    MissingId {
        /// Entity kind.
        kind: &'static str,
    },

    /// Optimistic concurrency check failed.
    #[error("version conflict on {kind}#{id}: expected {expected}, stored {actual}")]
    VersionConflict {
        /// Entity kind.
        kind: &'static str,
        /// Entity identifier.
        id: String,
        /// Version carried by the written entity.
        expected: i64,
        /// Version currently stored.
        actual: i64,
    },

    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Snapshot (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(kind: &'static str, id: impl ToString) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.to_string(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns true if this error is an optimistic concurrency rejection.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_detection() {
        let err = StoreError::VersionConflict {
            kind: "person",
            id: "1".into(),
            expected: 3,
            actual: 5,
        };
        assert!(err.is_conflict());
        assert!(!StoreError::not_found("person", 1).is_conflict());
    }

    #[test]
    fn error_display() {
        let err = StoreError::not_found("person", 42);
        assert_eq!(err.to_string(), "entity not found: person#42");

        let err = StoreError::MissingId { kind: "person" };
        assert!(err.to_string().contains("person"));
    }
}
