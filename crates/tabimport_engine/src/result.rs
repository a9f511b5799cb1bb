//! Outcome of reconciling one record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of reconciliation outcomes.
///
/// Exactly the data-changing statuses (`Inserted`, `Updated`,
/// `ForceUpdated`, `Deleted`, `Overridden`) report
/// [`data_changed`](ImportStatus::data_changed). `Overridden` counts as a
/// change: a real difference existed even though policy left it unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    /// Not processed yet.
    Pending,
    /// Destination absent, source record created.
    Inserted,
    /// Destination patched or replaced.
    Updated,
    /// Destination replaced despite a concurrency conflict.
    ForceUpdated,
    /// Destination deleted.
    Deleted,
    /// Content differed but no licensed action applied.
    Overridden,
    /// Destination absent and insert not licensed.
    Skipped,
    /// No difference found.
    Unchanged,
    /// Update rejected by the concurrency guard.
    Conflict,
    /// The destination store failed.
    Failed,
}

impl ImportStatus {
    /// Every status, in declaration order.
    pub const ALL: [ImportStatus; 10] = [
        ImportStatus::Pending,
        ImportStatus::Inserted,
        ImportStatus::Updated,
        ImportStatus::ForceUpdated,
        ImportStatus::Deleted,
        ImportStatus::Overridden,
        ImportStatus::Skipped,
        ImportStatus::Unchanged,
        ImportStatus::Conflict,
        ImportStatus::Failed,
    ];

    /// Returns true if the status denotes a real data difference.
    pub const fn data_changed(self) -> bool {
        matches!(
            self,
            ImportStatus::Inserted
                | ImportStatus::Updated
                | ImportStatus::ForceUpdated
                | ImportStatus::Deleted
                | ImportStatus::Overridden
        )
    }

    /// Returns true for rejected or failed records.
    pub const fn is_failure(self) -> bool {
        matches!(self, ImportStatus::Conflict | ImportStatus::Failed)
    }

    /// Returns the upper-case status name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ImportStatus::Pending => "PENDING",
            ImportStatus::Inserted => "INSERTED",
            ImportStatus::Updated => "UPDATED",
            ImportStatus::ForceUpdated => "FORCE_UPDATED",
            ImportStatus::Deleted => "DELETED",
            ImportStatus::Overridden => "OVERRIDDEN",
            ImportStatus::Skipped => "SKIPPED",
            ImportStatus::Unchanged => "UNCHANGED",
            ImportStatus::Conflict => "CONFLICT",
            ImportStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status plus an optional diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    status: ImportStatus,
    message: Option<String>,
}

impl ImportResult {
    /// Creates the neutral result every item starts with.
    pub const fn pending() -> Self {
        Self {
            status: ImportStatus::Pending,
            message: None,
        }
    }

    /// Creates a result with the given status.
    pub const fn new(status: ImportStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    /// Creates a failed result carrying the error description.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ImportStatus::Failed).with_message(message)
    }

    /// Attaches a diagnostic.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the status.
    pub const fn status(&self) -> ImportStatus {
        self.status
    }

    /// Returns the diagnostic, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns true if the status denotes a real data difference.
    pub const fn data_changed(&self) -> bool {
        self.status.data_changed()
    }

    /// Returns true once the item has been processed.
    pub fn is_settled(&self) -> bool {
        self.status != ImportStatus::Pending
    }
}

impl Default for ImportResult {
    fn default() -> Self {
        Self::pending()
    }
}

impl fmt::Display for ImportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({})", self.status, message),
            None => write!(f, "{}", self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_changed_matches_status_set() {
        for status in ImportStatus::ALL {
            let expected = matches!(
                status.as_str(),
                "INSERTED" | "UPDATED" | "FORCE_UPDATED" | "DELETED" | "OVERRIDDEN"
            );
            assert_eq!(status.data_changed(), expected, "{status}");
            assert_eq!(ImportResult::new(status).data_changed(), expected, "{status}");
        }
    }

    #[test]
    fn pending_is_neutral() {
        let result = ImportResult::default();
        assert_eq!(result.status(), ImportStatus::Pending);
        assert!(!result.data_changed());
        assert!(!result.is_settled());
        assert!(result.message().is_none());
    }

    #[test]
    fn failures() {
        assert!(ImportStatus::Conflict.is_failure());
        assert!(ImportStatus::Failed.is_failure());
        assert!(!ImportStatus::Overridden.is_failure());

        let result = ImportResult::failed("store offline");
        assert_eq!(result.to_string(), "FAILED (store offline)");
    }

    #[test]
    fn serializes_upper_case() {
        let json = serde_json::to_string(&ImportStatus::ForceUpdated).unwrap();
        assert_eq!(json, "\"FORCE_UPDATED\"");
    }
}
