//! Per-record import policy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six independent flags licensing what an import may do to one record.
///
/// `insert`, `update`, `merge` and `remove` license actions; `force` and
/// `sync` modify them. No flag implies another: how combinations interact
/// is decided by the reconciler.
///
/// # Example
///
/// ```rust
/// use tabimport_engine::ImportInstructions;
///
/// let policy = ImportInstructions::new().with_insert(true).with_sync(true);
/// assert!(policy.insert());
/// assert!(!policy.update());
/// assert_eq!(policy.to_string(), "insert+sync");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportInstructions {
    insert: bool,
    update: bool,
    merge: bool,
    remove: bool,
    force: bool,
    sync: bool,
}

impl ImportInstructions {
    /// Creates instructions with every flag cleared.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            insert: false,
            update: false,
            merge: false,
            remove: false,
            force: false,
            sync: false,
        }
    }

    /// Sets the `insert` flag.
    #[must_use]
    pub const fn with_insert(mut self, value: bool) -> Self {
        self.insert = value;
        self
    }

    /// Sets the `update` flag.
    #[must_use]
    pub const fn with_update(mut self, value: bool) -> Self {
        self.update = value;
        self
    }

    /// Sets the `merge` flag.
    #[must_use]
    pub const fn with_merge(mut self, value: bool) -> Self {
        self.merge = value;
        self
    }

    /// Sets the `remove` flag.
    #[must_use]
    pub const fn with_remove(mut self, value: bool) -> Self {
        self.remove = value;
        self
    }

    /// Sets the `force` flag.
    #[must_use]
    pub const fn with_force(mut self, value: bool) -> Self {
        self.force = value;
        self
    }

    /// Sets the `sync` flag.
    #[must_use]
    pub const fn with_sync(mut self, value: bool) -> Self {
        self.sync = value;
        self
    }

    /// May a missing destination record be created?
    pub const fn insert(&self) -> bool {
        self.insert
    }

    /// May a differing destination record be replaced wholesale?
    pub const fn update(&self) -> bool {
        self.update
    }

    /// May a differing destination record be patched field by field?
    pub const fn merge(&self) -> bool {
        self.merge
    }

    /// May a differing destination record be deleted?
    pub const fn remove(&self) -> bool {
        self.remove
    }

    /// Does an update proceed despite a concurrency conflict?
    pub const fn force(&self) -> bool {
        self.force
    }

    /// Is the canonical record written back into the source row?
    pub const fn sync(&self) -> bool {
        self.sync
    }

    /// Returns true if no flag is set.
    pub const fn is_empty(&self) -> bool {
        !(self.insert || self.update || self.merge || self.remove || self.force || self.sync)
    }

    fn flags(&self) -> [(&'static str, bool); 6] {
        [
            ("insert", self.insert),
            ("update", self.update),
            ("merge", self.merge),
            ("remove", self.remove),
            ("force", self.force),
            ("sync", self.sync),
        ]
    }
}

impl fmt::Display for ImportInstructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (name, _) in self.flags().into_iter().filter(|(_, set)| *set) {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let instructions = ImportInstructions::default();
        assert!(instructions.is_empty());
        assert_eq!(instructions, ImportInstructions::new());
        assert_eq!(instructions.to_string(), "none");
    }

    #[test]
    fn flags_are_independent() {
        let instructions = ImportInstructions::new().with_update(true).with_force(true);
        assert!(instructions.update());
        assert!(instructions.force());
        assert!(!instructions.insert());
        assert!(!instructions.merge());
        assert!(!instructions.remove());
        assert!(!instructions.sync());
        assert_eq!(instructions.to_string(), "update+force");
    }

    #[test]
    fn flags_can_be_cleared() {
        let instructions = ImportInstructions::new()
            .with_remove(true)
            .with_remove(false);
        assert!(instructions.is_empty());
    }
}
