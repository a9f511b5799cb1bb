//! Identifier generation.

use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Produces identifiers for entities persisted without one.
///
/// Stores call [`observe`](IdGenerator::observe) for every identifier they
/// learn about (loaded or caller-assigned) so that generated identifiers
/// never collide with existing ones.
pub trait IdGenerator<I>: Send + Sync {
    /// Returns a fresh identifier.
    fn generate(&self) -> I;

    /// Records an identifier already in use.
    fn observe(&self, _id: &I) {}
}

/// Monotonic `i64` identifiers, starting at 1.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicI64,
}

impl SequentialIds {
    /// Creates a generator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a generator whose first identifier is `first`.
    #[must_use]
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }

    /// Returns the identifier the next call to `generate` will produce.
    pub fn peek(&self) -> i64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator<i64> for SequentialIds {
    fn generate(&self) -> i64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    fn observe(&self, id: &i64) {
        self.next.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }
}

/// Random v4 UUID identifiers.
///
/// Collisions are astronomically unlikely but possible when several
/// processes generate identifiers for the same store.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator<Uuid> for UuidIds {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

impl IdGenerator<String> for UuidIds {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_is_monotonic() {
        let ids = SequentialIds::new();
        assert_eq!(ids.generate(), 1);
        assert_eq!(ids.generate(), 2);
        assert_eq!(ids.peek(), 3);
    }

    #[test]
    fn observe_skips_used_ids() {
        let ids = SequentialIds::new();
        ids.observe(&10);
        assert_eq!(ids.generate(), 11);

        // Lower ids never move the counter back
        ids.observe(&2);
        assert_eq!(ids.generate(), 12);
    }

    #[test]
    fn uuid_is_unique() {
        let a: Uuid = UuidIds.generate();
        let b: Uuid = UuidIds.generate();
        assert_ne!(a, b);

        let s: String = UuidIds.generate();
        assert_eq!(s.len(), 36);
    }
}
