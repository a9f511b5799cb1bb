//! Audit metadata carried by every entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation/update timestamps and optimistic concurrency version.
///
/// All fields stay `None` until the store stamps them. Payload comparison
/// ignores this block entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    /// When the entity was first persisted.
    pub creation_date: Option<DateTime<Utc>>,
    /// When the entity was last written.
    pub update_date: Option<DateTime<Utc>>,
    /// Monotonic write counter (0 after the first persist).
    pub version: Option<i64>,
}

impl AuditInfo {
    /// Creates an empty audit block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an audit block with all fields set.
    #[must_use]
    pub fn stamped(created: DateTime<Utc>, updated: DateTime<Utc>, version: i64) -> Self {
        Self {
            creation_date: Some(created),
            update_date: Some(updated),
            version: Some(version),
        }
    }

    /// Stamps a freshly persisted entity.
    pub fn mark_created(&mut self, now: DateTime<Utc>) {
        self.creation_date = Some(now);
        self.update_date = Some(now);
        self.version = Some(0);
    }

    /// Advances the version and update timestamp after a write.
    ///
    /// `creation_date` is preserved from `previous`.
    pub fn mark_updated(&mut self, previous: &AuditInfo, now: DateTime<Utc>) {
        self.creation_date = previous.creation_date;
        self.update_date = Some(now);
        self.version = Some(previous.version.map_or(0, |v| v + 1));
    }

    /// Returns true if `self` is older than `other` by version.
    ///
    /// Unversioned blocks are never considered stale.
    pub fn is_stale_against(&self, other: &AuditInfo) -> bool {
        match (self.version, other.version) {
            (Some(mine), Some(theirs)) => mine < theirs,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn created_starts_at_version_zero() {
        let mut audit = AuditInfo::new();
        audit.mark_created(at(1));
        assert_eq!(audit.version, Some(0));
        assert_eq!(audit.creation_date, audit.update_date);
    }

    #[test]
    fn updated_keeps_creation_date() {
        let previous = AuditInfo::stamped(at(1), at(1), 0);
        let mut audit = AuditInfo::new();
        audit.mark_updated(&previous, at(10));
        assert_eq!(audit.creation_date, Some(at(1)));
        assert_eq!(audit.update_date, Some(at(10)));
        assert_eq!(audit.version, Some(1));
    }

    #[test]
    fn staleness() {
        let old = AuditInfo::stamped(at(1), at(1), 3);
        let new = AuditInfo::stamped(at(1), at(2), 5);
        assert!(old.is_stale_against(&new));
        assert!(!new.is_stale_against(&old));
        assert!(!AuditInfo::new().is_stale_against(&new));
    }
}
