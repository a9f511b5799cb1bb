//! Reconciliation of one source record against the destination store.
//!
//! ## Decision table
//!
//! | Destination | Content   | Licensed flags                       | Action            | Status          |
//! |-------------|-----------|--------------------------------------|-------------------|-----------------|
//! | absent      | -         | `insert`                             | `persist`         | `INSERTED`      |
//! | absent      | -         | no `insert`                          | none              | `SKIPPED`       |
//! | present     | equal     | any                                  | none              | `UNCHANGED`     |
//! | present     | differs   | `remove`                             | `remove`          | `DELETED`       |
//! | present     | differs   | `merge`                              | patch + `merge`   | `UPDATED`       |
//! | present     | differs   | `update`, source current             | replace + `merge` | `UPDATED`       |
//! | present     | differs   | `update`, source stale, `force`      | replace + `merge` | `FORCE_UPDATED` |
//! | present     | differs   | `update`, source stale, no `force`   | none              | `CONFLICT`      |
//! | present     | differs   | none of the above                    | none              | `OVERRIDDEN`    |
//!
//! Rows are evaluated top to bottom: `remove` wins over `merge`, which wins
//! over `update`. A merge that finds no field to patch (every differing
//! source field is blank) ends `UNCHANGED`. The source is stale when the
//! version it carries is lower than the destination's.
//!
//! With `sync`, the canonical destination entity is refreshed from the
//! store and written back into the source record after the decision,
//! whatever the branch. There is nothing to write back after `SKIPPED` or
//! `DELETED`.

use crate::error::EngineResult;
use crate::instructions::ImportInstructions;
use crate::item::ImportItem;
use crate::result::{ImportResult, ImportStatus};
use crate::source::DataSource;
use tabimport_entity::{Entity, Repository};

/// What one reconciliation pass decided and did.
#[derive(Debug, Clone)]
pub struct Reconciliation<E> {
    /// Outcome recorded on the item.
    pub result: ImportResult,
    /// Destination state after the decision, `None` if absent or deleted.
    pub canonical: Option<E>,
    /// Fields patched by a merge.
    pub merged_fields: Vec<String>,
    /// Source columns changed by write-back; `None` if no write-back ran.
    pub synced_columns: Option<Vec<String>>,
}

impl<E> Reconciliation<E> {
    fn new(status: ImportStatus, canonical: Option<E>) -> Self {
        Self {
            result: ImportResult::new(status),
            canonical,
            merged_fields: Vec::new(),
            synced_columns: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.result = self.result.with_message(message);
        self
    }

    /// Returns the decided status.
    pub fn status(&self) -> ImportStatus {
        self.result.status()
    }
}

/// Applies the decision table of this module through a destination store.
///
/// The reconciler never retries: a store failure marks the item `FAILED`
/// and is returned to the caller.
#[derive(Debug)]
pub struct Reconciler<R> {
    store: R,
}

impl<R> Reconciler<R> {
    /// Creates a reconciler writing through `store`.
    pub fn new(store: R) -> Self {
        Self { store }
    }

    /// Returns the destination store.
    pub fn store(&self) -> &R {
        &self.store
    }

    /// Consumes the reconciler, returning the store.
    pub fn into_store(self) -> R {
        self.store
    }

    /// Decides and applies the action for one item, recording the result on it.
    ///
    /// Write-back is not performed; see [`process`](Self::process).
    ///
    /// # Errors
    ///
    /// Returns the store error after marking the item `FAILED`.
    pub fn reconcile<I, E>(&self, item: &mut ImportItem<I, E>) -> EngineResult<Reconciliation<E>>
    where
        E: Entity,
        R: Repository<E>,
    {
        match self.decide(item.data(), *item.instructions()) {
            Ok(outcome) => {
                item.set_result(outcome.result.clone());
                Ok(outcome)
            }
            Err(e) => {
                item.set_result(ImportResult::failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Reconciles one item, then writes the canonical entity back into
    /// `source` when the item asks for `sync`.
    ///
    /// After write-back the item carries the payload re-read from the source.
    ///
    /// # Errors
    ///
    /// Returns store errors (item marked `FAILED`) and write-back errors.
    pub fn process<S, E>(
        &self,
        item: &mut ImportItem<S::Id, E>,
        source: &mut S,
    ) -> EngineResult<Reconciliation<E>>
    where
        S: DataSource<Data = E>,
        S::Id: Clone,
        E: Entity,
        R: Repository<E>,
    {
        let mut outcome = self.reconcile(item)?;
        if !item.instructions().sync() {
            return Ok(outcome);
        }
        let Some(mut canonical) = outcome.canonical.take() else {
            return Ok(outcome);
        };

        if let Err(e) = self.store.refresh(&mut canonical) {
            item.set_result(ImportResult::failed(e.to_string()));
            return Err(e.into());
        }
        let report = source.sync(&item.with_data(canonical.clone()))?;
        outcome.canonical = Some(canonical);
        outcome.synced_columns = Some(report.changed_columns);
        item.replace_data(report.item.into_data());
        Ok(outcome)
    }

    fn decide<E>(&self, source: &E, instructions: ImportInstructions) -> EngineResult<Reconciliation<E>>
    where
        E: Entity,
        R: Repository<E>,
    {
        let destination = match source.id() {
            Some(id) => self.store.find(id)?,
            None => None,
        };

        let Some(mut destination) = destination else {
            if !instructions.insert() {
                tracing::debug!(kind = source.kind(), id = ?source.id(), "destination absent, insert not licensed");
                return Ok(Reconciliation::new(ImportStatus::Skipped, None)
                    .with_message("destination absent and insert not licensed"));
            }
            let mut inserted = source.clone();
            self.store.persist(&mut inserted)?;
            tracing::debug!(kind = inserted.kind(), id = ?inserted.id(), "inserted");
            return Ok(Reconciliation::new(ImportStatus::Inserted, Some(inserted)));
        };

        if source.same_content(&destination) {
            return Ok(Reconciliation::new(ImportStatus::Unchanged, Some(destination)));
        }

        if instructions.remove() {
            self.store.remove(&destination)?;
            tracing::debug!(kind = destination.kind(), id = ?destination.id(), "deleted");
            return Ok(Reconciliation::new(ImportStatus::Deleted, None));
        }

        if instructions.merge() {
            let fields = destination.merge_from(source);
            if fields.is_empty() {
                return Ok(Reconciliation::new(ImportStatus::Unchanged, Some(destination))
                    .with_message("no present field to merge"));
            }
            let merged = self.store.merge(&destination)?;
            tracing::debug!(kind = merged.kind(), id = ?merged.id(), ?fields, "merged");
            let mut outcome = Reconciliation::new(ImportStatus::Updated, Some(merged))
                .with_message(format!("merged {}", fields.join(", ")));
            outcome.merged_fields = fields;
            return Ok(outcome);
        }

        if instructions.update() {
            let stale = source.audit().is_stale_against(destination.audit());
            let versions = format!(
                "source version {} behind destination version {}",
                display_version(source.audit().version),
                display_version(destination.audit().version)
            );
            if stale && !instructions.force() {
                tracing::warn!(kind = destination.kind(), id = ?destination.id(), "{versions}, update rejected");
                return Ok(Reconciliation::new(ImportStatus::Conflict, Some(destination))
                    .with_message(versions));
            }

            destination.replace_from(source);
            let updated = self.store.merge(&destination)?;
            tracing::debug!(kind = updated.kind(), id = ?updated.id(), forced = stale, "updated");
            return Ok(if stale {
                Reconciliation::new(ImportStatus::ForceUpdated, Some(updated)).with_message(versions)
            } else {
                Reconciliation::new(ImportStatus::Updated, Some(updated))
            });
        }

        tracing::debug!(kind = destination.kind(), id = ?destination.id(), "difference left unresolved");
        Ok(Reconciliation::new(ImportStatus::Overridden, Some(destination))
            .with_message("content differs but no update, merge or remove licensed"))
    }
}

fn display_version(version: Option<i64>) -> String {
    version.map_or_else(|| "none".to_string(), |v| v.to_string())
}
