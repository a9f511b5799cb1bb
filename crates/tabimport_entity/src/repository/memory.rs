//! In-memory destination store.

use crate::entity::{Entity, IdGenerator};
use crate::error::{StoreError, StoreResult};
use crate::repository::Repository;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;

/// An in-memory destination store.
///
/// Suitable for:
/// - Unit and integration tests
/// - Dry runs that must not touch a real store
/// - Backing a snapshot-based store such as [`super::JsonFileRepository`]
///
/// # Thread Safety
///
/// All state lives behind a single `RwLock`; every operation is atomic.
///
/// # Example
///
/// ```rust,ignore
/// use tabimport_entity::{InMemoryRepository, Repository, SequentialIds};
///
/// let repo = InMemoryRepository::new().with_id_generator(SequentialIds::new());
/// let mut person = Person::named("Alice");
/// repo.persist(&mut person).unwrap();
/// assert_eq!(person.id, Some(1));
/// ```
pub struct InMemoryRepository<E: Entity> {
    entities: RwLock<BTreeMap<E::Id, E>>,
    ids: Option<Box<dyn IdGenerator<E::Id>>>,
    clock: fn() -> DateTime<Utc>,
}

impl<E: Entity> InMemoryRepository<E> {
    /// Creates an empty store without identifier generation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
            ids: None,
            clock: Utc::now,
        }
    }

    /// Creates a store pre-populated with entities.
    ///
    /// Entities without an identifier are skipped.
    #[must_use]
    pub fn with_entities(entities: impl IntoIterator<Item = E>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.entities.write();
            for entity in entities {
                if let Some(id) = entity.id().cloned() {
                    map.insert(id, entity);
                }
            }
        }
        repo
    }

    /// Installs an identifier generator.
    ///
    /// Every identifier already stored is reported to the generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator<E::Id> + 'static) -> Self {
        for id in self.entities.read().keys() {
            ids.observe(id);
        }
        self.ids = Some(Box::new(ids));
        self
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the number of stored entities.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    /// Returns a copy of every stored entity, ordered by identifier.
    pub fn snapshot(&self) -> Vec<E> {
        self.entities.read().values().cloned().collect()
    }

    /// Puts back the state `id` had before a mutation that could not be made durable.
    pub(crate) fn restore(&self, id: &E::Id, previous: Option<E>) {
        let mut entities = self.entities.write();
        match previous {
            Some(entity) => entities.insert(id.clone(), entity),
            None => entities.remove(id),
        };
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn resolve_id(&self, entity: &mut E) -> StoreResult<E::Id> {
        if let Some(id) = entity.id() {
            if let Some(ids) = &self.ids {
                ids.observe(id);
            }
            return Ok(id.clone());
        }

        let ids = self
            .ids
            .as_ref()
            .ok_or(StoreError::MissingId { kind: entity.kind() })?;
        let id = ids.generate();
        entity.set_id(Some(id.clone()));
        Ok(id)
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> fmt::Debug for InMemoryRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("kind", &E::KIND)
            .field("len", &self.len())
            .field("generates_ids", &self.ids.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    fn find(&self, id: &E::Id) -> StoreResult<Option<E>> {
        Ok(self.entities.read().get(id).cloned())
    }

    fn find_all(&self) -> StoreResult<Vec<E>> {
        Ok(self.snapshot())
    }

    fn persist(&self, entity: &mut E) -> StoreResult<()> {
        let id = self.resolve_id(entity)?;
        let mut entities = self.entities.write();

        if entities.contains_key(&id) {
            return Err(StoreError::already_exists(entity.kind(), &id));
        }

        entity.audit_mut().mark_created(self.now());
        entities.insert(id.clone(), entity.clone());
        tracing::debug!(kind = entity.kind(), %id, "persisted entity");
        Ok(())
    }

    fn merge(&self, entity: &E) -> StoreResult<E> {
        let id = entity
            .id()
            .cloned()
            .ok_or(StoreError::MissingId { kind: entity.kind() })?;
        let mut entities = self.entities.write();
        let mut next = entity.clone();

        match entities.get(&id) {
            Some(stored) => {
                if let (Some(expected), Some(actual)) =
                    (entity.audit().version, stored.audit().version)
                {
                    if expected != actual {
                        return Err(StoreError::VersionConflict {
                            kind: entity.kind(),
                            id: id.to_string(),
                            expected,
                            actual,
                        });
                    }
                }
                next.audit_mut().mark_updated(stored.audit(), self.now());
            }
            None => {
                if let Some(ids) = &self.ids {
                    ids.observe(&id);
                }
                next.audit_mut().mark_created(self.now());
            }
        }

        entities.insert(id.clone(), next.clone());
        tracing::debug!(kind = entity.kind(), %id, version = ?next.audit().version, "merged entity");
        Ok(next)
    }

    fn refresh(&self, entity: &mut E) -> StoreResult<()> {
        let id = entity
            .id()
            .ok_or(StoreError::MissingId { kind: entity.kind() })?;
        let stored = self
            .entities
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(entity.kind(), id))?;
        *entity = stored;
        Ok(())
    }

    fn remove(&self, entity: &E) -> StoreResult<()> {
        let id = entity
            .id()
            .ok_or(StoreError::MissingId { kind: entity.kind() })?;
        match self.entities.write().remove(id) {
            Some(_) => {
                tracing::debug!(kind = entity.kind(), %id, "removed entity");
                Ok(())
            }
            None => Err(StoreError::not_found(entity.kind(), id)),
        }
    }
}
