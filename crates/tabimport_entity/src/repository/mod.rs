//! Destination store contract and reference implementations.

mod file;
mod memory;

pub use file::JsonFileRepository;
pub use memory::InMemoryRepository;

use crate::entity::Entity;
use crate::error::StoreResult;

/// CRUD capability over persisted entities, keyed by identifier.
///
/// The import engine treats every call as atomic, synchronous and
/// authoritative for version and timestamp advancement. Retry policy, if
/// any, belongs to the implementation.
///
/// # Invariants
///
/// - `persist` fails with `AlreadyExists` if the identifier is taken
/// - `merge` returns the canonical post-write entity (advanced version,
///   fresh `update_date`), inserting it if absent
/// - `refresh` overwrites the given entity with the stored state
/// - `remove` makes the entity unreachable through `find`
///
/// # Implementors
///
/// - [`InMemoryRepository`] - For tests and ephemeral runs
/// - [`JsonFileRepository`] - Snapshot-per-write JSON file
pub trait Repository<E: Entity>: Send + Sync {
    /// Looks an entity up by identifier.
    fn find(&self, id: &E::Id) -> StoreResult<Option<E>>;

    /// Returns every stored entity, ordered by identifier.
    fn find_all(&self) -> StoreResult<Vec<E>>;

    /// Inserts a new entity.
    ///
    /// Assigns an identifier when the entity has none and the store can
    /// generate one, and stamps creation metadata. The given entity is
    /// updated to the stored state.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The identifier already exists
    /// - The entity has no identifier and none can be generated
    fn persist(&self, entity: &mut E) -> StoreResult<()>;

    /// Writes an entity and returns the canonical stored version.
    ///
    /// # Errors
    ///
    /// Returns `VersionConflict` if the entity carries a version different
    /// from the stored one.
    fn merge(&self, entity: &E) -> StoreResult<E>;

    /// Reloads the stored state into `entity`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the entity is not stored.
    fn refresh(&self, entity: &mut E) -> StoreResult<()>;

    /// Deletes the entity.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the entity is not stored.
    fn remove(&self, entity: &E) -> StoreResult<()>;
}
