//! JSON-file destination store.

use crate::entity::{Entity, IdGenerator};
use crate::error::StoreResult;
use crate::repository::{InMemoryRepository, Repository};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A destination store persisted as a JSON array in a single file.
///
/// Every mutation rewrites the whole snapshot: the new content goes to a
/// sibling temporary file which is then renamed over the original, so a
/// crash never leaves a half-written store behind. A mutation whose snapshot
/// cannot be written is rolled back, so memory never runs ahead of the file.
///
/// # Example
///
/// ```no_run
/// use tabimport_entity::{JsonFileRepository, SequentialIds};
/// # use tabimport_entity::{AuditInfo, Entity};
/// # #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
/// # struct Row { id: Option<i64>, audit: AuditInfo }
/// # impl Entity for Row {
/// #     type Id = i64;
/// #     const KIND: &'static str = "row";
/// #     fn id(&self) -> Option<&i64> { self.id.as_ref() }
/// #     fn set_id(&mut self, id: Option<i64>) { self.id = id; }
/// #     fn audit(&self) -> &AuditInfo { &self.audit }
/// #     fn audit_mut(&mut self) -> &mut AuditInfo { &mut self.audit }
/// #     fn same_content(&self, _: &Self) -> bool { true }
/// #     fn merge_from(&mut self, _: &Self) -> Vec<String> { Vec::new() }
/// #     fn replace_from(&mut self, _: &Self) {}
/// # }
/// use std::path::Path;
///
/// let repo: JsonFileRepository<Row> = JsonFileRepository::open(Path::new("store.json"))
///     .unwrap()
///     .with_id_generator(SequentialIds::new());
/// ```
#[derive(Debug)]
pub struct JsonFileRepository<E: Entity> {
    path: PathBuf,
    inner: InMemoryRepository<E>,
    writes: Mutex<()>,
}

impl<E> JsonFileRepository<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    /// Opens the store at `path`, loading the snapshot if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let entities: Vec<E> = if path.exists() {
            let bytes = fs::read(path)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                Vec::new()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            Vec::new()
        };

        tracing::debug!(path = %path.display(), count = entities.len(), "opened JSON store");

        Ok(Self {
            path: path.to_path_buf(),
            inner: InMemoryRepository::with_entities(entities),
            writes: Mutex::new(()),
        })
    }

    /// Installs an identifier generator (see [`InMemoryRepository::with_id_generator`]).
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator<E::Id> + 'static) -> Self {
        self.inner = self.inner.with_id_generator(ids);
        self
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of stored entities.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Writes the current snapshot to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub fn save(&self) -> StoreResult<()> {
        let snapshot = self.inner.snapshot();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Saves after a mutation of `id`, restoring `previous` if the save fails.
    fn commit(&self, id: Option<&E::Id>, previous: Option<E>) -> StoreResult<()> {
        self.save().inspect_err(|e| {
            if let Some(id) = id {
                tracing::warn!(kind = E::KIND, %id, error = %e, "snapshot write failed, change rolled back");
                self.inner.restore(id, previous);
            }
        })
    }
}

impl<E> Repository<E> for JsonFileRepository<E>
where
    E: Entity + Serialize + DeserializeOwned,
{
    fn find(&self, id: &E::Id) -> StoreResult<Option<E>> {
        self.inner.find(id)
    }

    fn find_all(&self) -> StoreResult<Vec<E>> {
        self.inner.find_all()
    }

    fn persist(&self, entity: &mut E) -> StoreResult<()> {
        let _writes = self.writes.lock();
        let original = entity.clone();
        self.inner.persist(entity)?;
        if let Err(e) = self.commit(entity.id(), None) {
            *entity = original;
            return Err(e);
        }
        Ok(())
    }

    fn merge(&self, entity: &E) -> StoreResult<E> {
        let _writes = self.writes.lock();
        let previous = match entity.id() {
            Some(id) => self.inner.find(id)?,
            None => None,
        };
        let merged = self.inner.merge(entity)?;
        self.commit(merged.id(), previous)?;
        Ok(merged)
    }

    fn refresh(&self, entity: &mut E) -> StoreResult<()> {
        self.inner.refresh(entity)
    }

    fn remove(&self, entity: &E) -> StoreResult<()> {
        let _writes = self.writes.lock();
        let previous = match entity.id() {
            Some(id) => self.inner.find(id)?,
            None => None,
        };
        self.inner.remove(entity)?;
        self.commit(entity.id(), previous)
    }
}
