//! Error types for document and cell access.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Errors that can occur while accessing a tabular document.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The document file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The document file exists but cannot be read.
    #[error("file cannot be read: {}", path.display())]
    NotReadable {
        /// Path of the file.
        path: PathBuf,
    },

    /// Another process holds the document.
    #[error("document is locked by another process: {}", path.display())]
    Locked {
        /// Path of the file.
        path: PathBuf,
    },

    /// A stream-backed document was already consumed by a previous open.
    #[error("document stream was already consumed")]
    SourceConsumed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV parsing or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Operation requires an open document.
    #[error("document is closed")]
    DocumentClosed,

    /// Operation requires a closed document.
    #[error("document is already open")]
    DocumentOpen,

    /// Operation requires a writable document.
    #[error("document is read-only")]
    ReadOnly,

    /// The row does not exist.
    #[error("sheet has no row with index {row}")]
    MissingRow {
        /// Row index.
        row: usize,
    },

    /// The cell does not exist in the row.
    #[error("row {row} has no cell with index {column}")]
    MissingCell {
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
    },

    /// No header names the column.
    #[error("sheet has no column named {name:?}")]
    UnknownColumn {
        /// Column name.
        name: String,
    },

    /// Cell content does not match the expected typed representation.
    #[error("cell {column} of row {row} does not hold a {expected} value: {found:?}")]
    Format {
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
        /// Expected representation.
        expected: &'static str,
        /// Raw content found.
        found: String,
    },

    /// Flushing or releasing the document failed; the document is closed anyway.
    #[error("error closing document: {source}")]
    Close {
        /// The underlying failure.
        #[source]
        source: Box<SheetError>,
    },
}

impl SheetError {
    /// Creates a format error.
    pub fn format(row: usize, column: usize, expected: &'static str, found: impl Into<String>) -> Self {
        Self::Format {
            row,
            column,
            expected,
            found: found.into(),
        }
    }

    /// Creates an unknown column error.
    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn { name: name.into() }
    }

    /// Wraps a failure that happened while closing.
    pub fn close(source: SheetError) -> Self {
        Self::Close {
            source: Box::new(source),
        }
    }

    /// Returns true for content errors (as opposed to lifecycle or I/O errors).
    pub fn is_format(&self) -> bool {
        matches!(self, SheetError::Format { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_display() {
        let err = SheetError::format(3, 1, "character", "AB");
        assert!(err.is_format());
        assert_eq!(
            err.to_string(),
            "cell 1 of row 3 does not hold a character value: \"AB\""
        );
    }

    #[test]
    fn close_wraps_source() {
        let err = SheetError::close(SheetError::ReadOnly);
        assert!(err.to_string().contains("read-only"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
