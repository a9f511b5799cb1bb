//! Import driver and run report.

use crate::config::ImportConfig;
use crate::error::EngineResult;
use crate::item::ImportItem;
use crate::reconcile::{Reconciler, Reconciliation};
use crate::result::{ImportResult, ImportStatus};
use crate::source::DataSource;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Instant;
use tabimport_entity::{Entity, Repository};

/// Outcome of one item in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    /// Source item identifier (row index for a sheet).
    pub item: String,
    /// Destination entity identifier, if known.
    pub entity_id: Option<String>,
    /// Decided status.
    pub status: ImportStatus,
    /// Diagnostic, if any.
    pub message: Option<String>,
    /// Fields patched by a merge.
    pub merged_fields: Vec<String>,
    /// Source columns changed by write-back.
    pub synced_columns: Vec<String>,
}

impl ItemReport {
    fn new<I: fmt::Display, E: Entity>(item: &ImportItem<I, E>, outcome: Option<&Reconciliation<E>>) -> Self {
        let entity_id = outcome
            .and_then(|o| o.canonical.as_ref())
            .and_then(Entity::id)
            .or_else(|| item.data().id())
            .map(ToString::to_string);
        let result: &ImportResult = item.result();
        Self {
            item: item.id().to_string(),
            entity_id,
            status: result.status(),
            message: result.message().map(str::to_string),
            merged_fields: outcome.map(|o| o.merged_fields.clone()).unwrap_or_default(),
            synced_columns: outcome
                .and_then(|o| o.synced_columns.clone())
                .unwrap_or_default(),
        }
    }
}

/// Summary of an import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    items: Vec<ItemReport>,
    counts: BTreeMap<ImportStatus, usize>,
    unmatched: Vec<String>,
}

impl ImportReport {
    fn record(&mut self, report: ItemReport) {
        *self.counts.entry(report.status).or_default() += 1;
        self.items.push(report);
    }

    /// Returns every item outcome in source order.
    pub fn items(&self) -> &[ItemReport] {
        &self.items
    }

    /// Returns how many items ended with `status`.
    pub fn count(&self, status: ImportStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Returns the number of processed items.
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of items whose status reports a data change.
    pub fn changed(&self) -> usize {
        self.counts
            .iter()
            .filter(|(status, _)| status.data_changed())
            .map(|(_, n)| n)
            .sum()
    }

    /// Returns the number of conflicting or failed items.
    pub fn failures(&self) -> usize {
        self.counts
            .iter()
            .filter(|(status, _)| status.is_failure())
            .map(|(_, n)| n)
            .sum()
    }

    /// Returns true if no item conflicted or failed.
    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }

    /// Destination identifiers no source item referenced.
    ///
    /// Empty unless the run was configured to report them.
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} items", self.total())?;
        for (status, n) in &self.counts {
            write!(f, ", {n} {status}")?;
        }
        if !self.unmatched.is_empty() {
            write!(f, ", {} unmatched", self.unmatched.len())?;
        }
        Ok(())
    }
}

/// Runs a whole source through a [`Reconciler`].
///
/// Items are processed one at a time in source order. A store failure is
/// recorded on its item as `FAILED` and the run goes on, unless
/// [`ImportConfig::fail_fast`] is set. Document errors always abort the run.
/// The source is closed on every exit path.
///
/// # Example
///
/// ```rust,ignore
/// let importer = Importer::new(store, ImportConfig::default());
/// let mut source = SheetDataSource::new(Workbook::from_path("people.csv")?, PersonMapper);
/// let report = importer.run(&mut source)?;
/// println!("{report}");
/// ```
#[derive(Debug)]
pub struct Importer<R> {
    reconciler: Reconciler<R>,
    config: ImportConfig,
}

impl<R> Importer<R> {
    /// Creates an importer writing through `store`.
    pub fn new(store: R, config: ImportConfig) -> Self {
        Self {
            reconciler: Reconciler::new(store),
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Returns the reconciler.
    pub fn reconciler(&self) -> &Reconciler<R> {
        &self.reconciler
    }

    /// Returns the destination store.
    pub fn store(&self) -> &R {
        self.reconciler.store()
    }

    /// Opens `source`, reconciles every item, and closes it.
    ///
    /// # Errors
    ///
    /// Returns document errors, and store errors when failing fast. An
    /// error from the walk takes precedence over one from closing.
    pub fn run<S, E>(&self, source: &mut S) -> EngineResult<ImportReport>
    where
        S: DataSource<Data = E>,
        S::Id: Clone + fmt::Display,
        E: Entity,
        R: Repository<E>,
    {
        source.open()?;
        let walked = self.walk(source);
        let closed = source.close();

        match (walked, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::warn!(error = %close_err, "closing source failed after earlier error");
                Err(e)
            }
        }
    }

    fn walk<S, E>(&self, source: &mut S) -> EngineResult<ImportReport>
    where
        S: DataSource<Data = E>,
        S::Id: Clone + fmt::Display,
        E: Entity,
        R: Repository<E>,
    {
        let started = Instant::now();
        let mut report = ImportReport::default();
        let mut referenced = HashSet::new();

        while let Some(mut item) = source.next()? {
            referenced.extend(item.data().key());

            match self.reconciler.process(&mut item, source) {
                Ok(outcome) => {
                    referenced.extend(outcome.canonical.as_ref().and_then(|e| e.key()));
                    report.record(ItemReport::new(&item, Some(&outcome)));
                }
                Err(e) if e.is_store_error() && !self.config.fail_fast => {
                    tracing::warn!(item = %item.id(), error = %e, "store failure recorded on item");
                    report.record(ItemReport::new(&item, None));
                }
                Err(e) => return Err(e),
            }
        }

        if self.config.report_unmatched {
            report.unmatched = self
                .reconciler
                .store()
                .find_all()?
                .iter()
                .filter(|entity| entity.key().is_some_and(|key| !referenced.contains(&key)))
                .filter_map(|entity| entity.id().map(ToString::to_string))
                .collect();
        }

        tracing::info!(
            items = report.total(),
            changed = report.changed(),
            failures = report.failures(),
            unmatched = report.unmatched.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "import finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::ImportInstructions;
    use crate::sheet_source::SheetDataSource;
    use crate::test_entity::{Pet, PetMapper};
    use std::path::Path;
    use tabimport_entity::{InMemoryRepository, SequentialIds, StoreError, StoreResult};
    use tabimport_sheet::Workbook;
    use tempfile::TempDir;

    fn run_sheet<R: Repository<Pet>>(
        importer: &Importer<R>,
        path: &Path,
    ) -> EngineResult<ImportReport> {
        let mut source = SheetDataSource::with_config(
            Workbook::from_path(path).unwrap(),
            PetMapper,
            importer.config(),
        );
        importer.run(&mut source)
    }

    fn store() -> InMemoryRepository<Pet> {
        let store = InMemoryRepository::new().with_id_generator(SequentialIds::new());
        let mut rex = Pet::with_id(1, "Rex");
        store.persist(&mut rex).unwrap();
        let mut tom = Pet::with_id(2, "Tom");
        store.persist(&mut tom).unwrap();
        store
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore(InMemoryRepository<Pet>);

    impl Repository<Pet> for ReadOnlyStore {
        fn find(&self, id: &i64) -> StoreResult<Option<Pet>> {
            self.0.find(id)
        }
        fn find_all(&self) -> StoreResult<Vec<Pet>> {
            self.0.find_all()
        }
        fn persist(&self, _: &mut Pet) -> StoreResult<()> {
            Err(StoreError::backend("read-only"))
        }
        fn merge(&self, _: &Pet) -> StoreResult<Pet> {
            Err(StoreError::backend("read-only"))
        }
        fn refresh(&self, pet: &mut Pet) -> StoreResult<()> {
            self.0.refresh(pet)
        }
        fn remove(&self, _: &Pet) -> StoreResult<()> {
            Err(StoreError::backend("read-only"))
        }
    }

    /// Store whose lookups of one id always fail.
    struct BrokenLookup(InMemoryRepository<Pet>, i64);

    impl Repository<Pet> for BrokenLookup {
        fn find(&self, id: &i64) -> StoreResult<Option<Pet>> {
            if *id == self.1 {
                return Err(StoreError::backend("lookup failed"));
            }
            self.0.find(id)
        }
        fn find_all(&self) -> StoreResult<Vec<Pet>> {
            self.0.find_all()
        }
        fn persist(&self, pet: &mut Pet) -> StoreResult<()> {
            self.0.persist(pet)
        }
        fn merge(&self, pet: &Pet) -> StoreResult<Pet> {
            self.0.merge(pet)
        }
        fn refresh(&self, pet: &mut Pet) -> StoreResult<()> {
            self.0.refresh(pet)
        }
        fn remove(&self, pet: &Pet) -> StoreResult<()> {
            self.0.remove(pet)
        }
    }

    #[test]
    fn report_counts_statuses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pets.csv");
        std::fs::write(
            &path,
            "ID,NAME,INSERT,UPDATE\n1,Rex,,\n2,Tommy,,Y\n,Kit,Y,\n,Stray,,\n",
        )
        .unwrap();

        let importer = Importer::new(store(), ImportConfig::default());
        let report = run_sheet(&importer, &path).unwrap();

        assert_eq!(report.total(), 4);
        assert_eq!(report.count(ImportStatus::Unchanged), 1);
        assert_eq!(report.count(ImportStatus::Updated), 1);
        assert_eq!(report.count(ImportStatus::Inserted), 1);
        assert_eq!(report.count(ImportStatus::Skipped), 1);
        assert_eq!(report.changed(), 2);
        assert!(report.is_clean());
        assert_eq!(report.items()[2].entity_id.as_deref(), Some("3"));
        assert_eq!(
            report.to_string(),
            "4 items, 1 INSERTED, 1 UPDATED, 1 SKIPPED, 1 UNCHANGED"
        );
    }

    #[test]
    fn store_failures_are_recorded_per_item() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pets.csv");
        std::fs::write(&path, "ID,NAME,UPDATE\n1,Max,Y\n2,Tom,Y\n").unwrap();

        let importer = Importer::new(ReadOnlyStore(store()), ImportConfig::default());
        let report = run_sheet(&importer, &path).unwrap();

        assert_eq!(report.count(ImportStatus::Failed), 1);
        assert_eq!(report.count(ImportStatus::Unchanged), 1);
        assert!(!report.is_clean());
        assert!(report.items()[0]
            .message
            .as_deref()
            .unwrap()
            .contains("read-only"));
    }

    #[test]
    fn lookup_failure_marks_item_failed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pets.csv");
        std::fs::write(&path, "ID,NAME,INSERT\n1,Rex,\n2,Tom,\n,Kit,Y\n").unwrap();

        let importer = Importer::new(BrokenLookup(store(), 1), ImportConfig::default());
        let report = run_sheet(&importer, &path).unwrap();

        assert_eq!(report.total(), 3);
        let first = &report.items()[0];
        assert_eq!(first.status, ImportStatus::Failed);
        assert!(first.message.as_deref().unwrap().contains("lookup failed"));
        assert_eq!(report.items()[1].status, ImportStatus::Unchanged);
        assert_eq!(report.items()[2].status, ImportStatus::Inserted);
        assert!(!report.is_clean());
    }

    #[test]
    fn fail_fast_aborts_and_closes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pets.csv");
        std::fs::write(&path, "ID,NAME,UPDATE\n1,Max,Y\n2,Tom,Y\n").unwrap();

        let importer = Importer::new(
            ReadOnlyStore(store()),
            ImportConfig::default().with_fail_fast(true),
        );
        let err = run_sheet(&importer, &path).unwrap_err();
        assert!(err.is_store_error());

        // The document lock was released
        let mut sheet = Workbook::from_path(&path).unwrap();
        sheet.open().unwrap();
        sheet.close().unwrap();
    }

    #[test]
    fn unmatched_destinations_are_listed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pets.csv");
        std::fs::write(&path, "ID,NAME\n1,Rex\n").unwrap();

        let importer = Importer::new(
            store(),
            ImportConfig::default()
                .with_default_instructions(ImportInstructions::new().with_insert(true))
                .with_report_unmatched(true),
        );
        let report = run_sheet(&importer, &path).unwrap();
        assert_eq!(report.unmatched(), ["2"]);
        assert!(report.to_string().ends_with("1 unmatched"));
    }

    #[test]
    fn report_serializes() {
        let mut report = ImportReport::default();
        let item = ImportItem::new(4usize, Pet::with_id(9, "Rex"), ImportInstructions::new());
        report.record(ItemReport::new(&item, None));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["items"][0]["item"], "4");
        assert_eq!(json["items"][0]["entity_id"], "9");
        assert_eq!(json["items"][0]["status"], "PENDING");
        assert_eq!(json["counts"]["PENDING"], 1);
    }
}
