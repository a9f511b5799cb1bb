//! Kind-aware entity identity.

use std::fmt;

/// Identity of a persisted entity: kind discriminator plus identifier.
///
/// Equality and hashing use both parts, so keys of different kinds never
/// collide even when their identifiers do. This is what set-based matching
/// between source rows and destination entities relies on.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey<I> {
    kind: &'static str,
    id: I,
}

impl<I> EntityKey<I> {
    /// Creates a key.
    #[inline]
    pub const fn new(kind: &'static str, id: I) -> Self {
        Self { kind, id }
    }

    /// Returns the kind.
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns the identifier.
    #[inline]
    pub fn id(&self) -> &I {
        &self.id
    }

    /// Consumes the key and returns the identifier.
    pub fn into_id(self) -> I {
        self.id
    }
}

impl<I: fmt::Display> fmt::Debug for EntityKey<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey({}#{})", self.kind, self.id)
    }
}

impl<I: fmt::Display> fmt::Display for EntityKey<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}
