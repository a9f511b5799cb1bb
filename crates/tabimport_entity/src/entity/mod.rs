//! Entity model.

mod audit;
mod id;
mod key;

pub use audit::AuditInfo;
pub use id::{IdGenerator, SequentialIds, UuidIds};
pub use key::EntityKey;

use std::fmt;
use std::hash::Hash;

/// A persisted record: identifier, payload fields and audit metadata.
///
/// Implementors describe their payload through three operations:
/// [`same_content`](Entity::same_content) compares payload fields only,
/// [`merge_from`](Entity::merge_from) patches the fields that differ and
/// [`replace_from`](Entity::replace_from) overwrites every tracked field.
/// None of them may touch the identifier or the audit block.
///
/// # Identity
///
/// Identity is the pair (kind, identifier). An enum-shaped entity whose
/// variants must never compare equal overrides [`kind`](Entity::kind) to
/// return a per-variant discriminator.
///
/// # Example
///
/// ```rust
/// use tabimport_entity::{AuditInfo, Entity};
///
/// #[derive(Debug, Clone, Default)]
/// struct Tag {
///     id: Option<i64>,
///     label: Option<String>,
///     audit: AuditInfo,
/// }
///
/// impl Entity for Tag {
///     type Id = i64;
///     const KIND: &'static str = "tag";
///
///     fn id(&self) -> Option<&i64> { self.id.as_ref() }
///     fn set_id(&mut self, id: Option<i64>) { self.id = id; }
///     fn audit(&self) -> &AuditInfo { &self.audit }
///     fn audit_mut(&mut self) -> &mut AuditInfo { &mut self.audit }
///     fn same_content(&self, other: &Self) -> bool { self.label == other.label }
///     fn merge_from(&mut self, source: &Self) -> Vec<String> {
///         match &source.label {
///             Some(label) if self.label.as_ref() != Some(label) => {
///                 self.label = Some(label.clone());
///                 vec!["label".into()]
///             }
///             _ => Vec::new(),
///         }
///     }
///     fn replace_from(&mut self, source: &Self) { self.label = source.label.clone(); }
/// }
///
/// let a = Tag { id: Some(1), label: Some("x".into()), ..Default::default() };
/// let b = Tag { id: Some(1), label: Some("y".into()), ..Default::default() };
/// assert!(a.same_identity(&b));
/// assert!(!a.same_content(&b));
/// ```
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Identifier type.
    type Id: Clone + Eq + Hash + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Kind discriminator shared by every instance of the type.
    const KIND: &'static str;

    /// Returns the kind of this instance.
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    /// Returns the identifier, if assigned.
    fn id(&self) -> Option<&Self::Id>;

    /// Sets or clears the identifier.
    fn set_id(&mut self, id: Option<Self::Id>);

    /// Returns the audit metadata.
    fn audit(&self) -> &AuditInfo;

    /// Returns the audit metadata for modification.
    fn audit_mut(&mut self) -> &mut AuditInfo;

    /// Returns true if every payload field equals the other entity's.
    fn same_content(&self, other: &Self) -> bool;

    /// Copies the present source fields that differ onto `self`.
    ///
    /// Returns the names of the fields that were changed.
    fn merge_from(&mut self, source: &Self) -> Vec<String>;

    /// Overwrites every payload field with the source's.
    fn replace_from(&mut self, source: &Self);

    /// Returns the identity key, or `None` when no identifier is assigned.
    fn key(&self) -> Option<EntityKey<Self::Id>> {
        self.id().map(|id| EntityKey::new(self.kind(), id.clone()))
    }

    /// Returns true if both entities denote the same persisted record.
    ///
    /// Kinds are compared before identifiers so the relation stays symmetric
    /// across variants; entities without identifiers never match.
    fn same_identity(&self, other: &Self) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match (self.id(), other.id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Copies identifier and audit metadata from another entity.
    fn copy_identity_from(&mut self, other: &Self) {
        self.set_id(other.id().cloned());
        *self.audit_mut() = other.audit().clone();
    }
}
