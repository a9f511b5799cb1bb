//! Import configuration.

use crate::instructions::ImportInstructions;

/// Names of the columns the engine itself reads and writes.
///
/// Every other column belongs to the row mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Entity identifier column.
    pub id: String,
    /// Creation timestamp column.
    pub creation_date: String,
    /// Last update timestamp column.
    pub update_date: String,
    /// Version column.
    pub version: String,
    /// `insert` instruction column.
    pub insert: String,
    /// `update` instruction column.
    pub update: String,
    /// `merge` instruction column.
    pub merge: String,
    /// `remove` instruction column.
    pub remove: String,
    /// `force` instruction column.
    pub force: String,
    /// `sync` instruction column.
    pub sync: String,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            id: "ID".into(),
            creation_date: "CREATION_DATE".into(),
            update_date: "UPDATE_DATE".into(),
            version: "VERSION".into(),
            insert: "INSERT".into(),
            update: "UPDATE".into(),
            merge: "MERGE".into(),
            remove: "REMOVE".into(),
            force: "FORCE".into(),
            sync: "SYNC".into(),
        }
    }
}

impl ColumnLayout {
    /// Creates the default layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renames the identifier column.
    #[must_use]
    pub fn with_id_column(mut self, name: impl Into<String>) -> Self {
        self.id = name.into();
        self
    }

    /// Renames the audit columns.
    #[must_use]
    pub fn with_audit_columns(
        mut self,
        creation_date: impl Into<String>,
        update_date: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.creation_date = creation_date.into();
        self.update_date = update_date.into();
        self.version = version.into();
        self
    }

    /// Instruction columns in flag order: insert, update, merge, remove, force, sync.
    pub fn instruction_columns(&self) -> [&str; 6] {
        [
            &self.insert,
            &self.update,
            &self.merge,
            &self.remove,
            &self.force,
            &self.sync,
        ]
    }

    /// Audit columns: creation date, update date, version.
    pub fn audit_columns(&self) -> [&str; 3] {
        [&self.creation_date, &self.update_date, &self.version]
    }

    /// Returns true if the engine owns the column.
    pub fn is_reserved(&self, name: &str) -> bool {
        name == self.id
            || self.audit_columns().contains(&name)
            || self.instruction_columns().contains(&name)
    }
}

/// Configuration for an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Column names.
    pub layout: ColumnLayout,

    /// Instructions for rows of a sheet that has no instruction column.
    pub default_instructions: ImportInstructions,

    /// Abort the run on the first store error instead of recording it.
    pub fail_fast: bool,

    /// List destination records no source row referenced.
    pub report_unmatched: bool,
}

impl ImportConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the column layout.
    #[must_use]
    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the fallback instructions.
    #[must_use]
    pub fn with_default_instructions(mut self, instructions: ImportInstructions) -> Self {
        self.default_instructions = instructions;
        self
    }

    /// Sets whether store errors abort the run.
    #[must_use]
    pub fn with_fail_fast(mut self, value: bool) -> Self {
        self.fail_fast = value;
        self
    }

    /// Sets whether unmatched destination records are reported.
    #[must_use]
    pub fn with_report_unmatched(mut self, value: bool) -> Self {
        self.report_unmatched = value;
        self
    }
}
