//! Error types for the import engine.

use tabimport_entity::StoreError;
use tabimport_sheet::SheetError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while importing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A mandatory constructor argument was not supplied.
    #[error("missing mandatory argument: {name}")]
    MissingArgument {
        /// Argument name.
        name: &'static str,
    },

    /// `current` was called before the first `next`.
    #[error("cursor is not positioned on a row, call next() first")]
    CursorNotPositioned,

    /// Document access failed.
    #[error("document error: {0}")]
    Sheet(#[from] SheetError),

    /// The destination store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Creates a missing argument error.
    pub fn missing(name: &'static str) -> Self {
        Self::MissingArgument { name }
    }

    /// Returns true for destination store failures.
    ///
    /// Store failures are recorded on the item; everything else aborts the run.
    pub fn is_store_error(&self) -> bool {
        matches!(self, EngineError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_per_item() {
        let err: EngineError = StoreError::not_found("person", 7).into();
        assert!(err.is_store_error());
        assert!(!EngineError::CursorNotPositioned.is_store_error());
        assert!(!EngineError::from(SheetError::DocumentClosed).is_store_error());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            EngineError::missing("instructions").to_string(),
            "missing mandatory argument: instructions"
        );
        let err = EngineError::from(SheetError::DocumentClosed);
        assert_eq!(err.to_string(), "document error: document is closed");
    }
}
