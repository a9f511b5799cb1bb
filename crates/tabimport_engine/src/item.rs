//! The unit of reconciliation work.

use crate::error::{EngineError, EngineResult};
use crate::instructions::ImportInstructions;
use crate::result::ImportResult;
use std::hash::{Hash, Hasher};

/// One source record on its way to the destination store.
///
/// Pairs an item identifier (for a sheet, the row index), the payload
/// entity read from the source, the instructions that apply to it, and the
/// outcome of the last reconciliation pass.
///
/// Equality and hashing look at the item identifier only, so items can be
/// matched set-wise regardless of payload or outcome.
#[derive(Debug, Clone)]
pub struct ImportItem<I, T> {
    id: I,
    data: T,
    instructions: ImportInstructions,
    result: ImportResult,
}

impl<I, T> ImportItem<I, T> {
    /// Creates an item with a pending result.
    pub fn new(id: I, data: T, instructions: ImportInstructions) -> Self {
        Self {
            id,
            data,
            instructions,
            result: ImportResult::pending(),
        }
    }

    /// Starts building an item from parts that may be missing.
    pub fn builder() -> ImportItemBuilder<I, T> {
        ImportItemBuilder::default()
    }

    /// Returns the item identifier.
    pub fn id(&self) -> &I {
        &self.id
    }

    /// Returns the payload.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns the instructions.
    pub fn instructions(&self) -> &ImportInstructions {
        &self.instructions
    }

    /// Returns the outcome of the last pass.
    pub fn result(&self) -> &ImportResult {
        &self.result
    }

    /// Returns true if the last pass changed data.
    pub fn data_changed(&self) -> bool {
        self.result.data_changed()
    }

    /// Records the outcome of a pass, replacing any earlier one.
    pub fn set_result(&mut self, result: ImportResult) {
        self.result = result;
    }

    /// Replaces the payload, returning the previous one.
    pub fn replace_data(&mut self, data: T) -> T {
        std::mem::replace(&mut self.data, data)
    }

    /// Returns a copy with another payload, keeping identifier, instructions and result.
    pub fn with_data<U>(&self, data: U) -> ImportItem<I, U>
    where
        I: Clone,
    {
        ImportItem {
            id: self.id.clone(),
            data,
            instructions: self.instructions,
            result: self.result.clone(),
        }
    }

    /// Consumes the item, returning its payload.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<I: PartialEq, T> PartialEq for ImportItem<I, T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<I: Eq, T> Eq for ImportItem<I, T> {}

impl<I: Hash, T> Hash for ImportItem<I, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Builder that refuses to produce an item with a missing part.
#[derive(Debug)]
pub struct ImportItemBuilder<I, T> {
    id: Option<I>,
    data: Option<T>,
    instructions: Option<ImportInstructions>,
}

impl<I, T> Default for ImportItemBuilder<I, T> {
    fn default() -> Self {
        Self {
            id: None,
            data: None,
            instructions: None,
        }
    }
}

impl<I, T> ImportItemBuilder<I, T> {
    /// Sets the item identifier.
    #[must_use]
    pub fn id(mut self, id: I) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the instructions.
    #[must_use]
    pub fn instructions(mut self, instructions: ImportInstructions) -> Self {
        self.instructions = Some(instructions);
        self
    }

    /// Builds the item.
    ///
    /// # Errors
    ///
    /// Returns `MissingArgument` naming the first absent part.
    pub fn build(self) -> EngineResult<ImportItem<I, T>> {
        let id = self.id.ok_or(EngineError::missing("id"))?;
        let data = self.data.ok_or(EngineError::missing("data"))?;
        let instructions = self
            .instructions
            .ok_or(EngineError::missing("instructions"))?;
        Ok(ImportItem::new(id, data, instructions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ImportStatus;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn new_item_is_pending() {
        let item = ImportItem::new(1usize, "payload", ImportInstructions::new());
        assert_eq!(item.result().status(), ImportStatus::Pending);
        assert!(!item.data_changed());
    }

    #[test]
    fn builder_requires_every_part() {
        let err = ImportItem::<usize, &str>::builder()
            .data("x")
            .instructions(ImportInstructions::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingArgument { name: "id" }));

        let err = ImportItem::<usize, &str>::builder()
            .id(3)
            .instructions(ImportInstructions::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingArgument { name: "data" }));

        let err = ImportItem::<usize, &str>::builder()
            .id(3)
            .data("x")
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingArgument { name: "instructions" }));

        let item = ImportItem::builder()
            .id(3usize)
            .data("x")
            .instructions(ImportInstructions::new().with_insert(true))
            .build()
            .unwrap();
        assert_eq!(*item.id(), 3);
        assert!(!item.data_changed());
    }

    #[test]
    fn result_is_replaced_per_pass() {
        let mut item = ImportItem::new(1usize, (), ImportInstructions::new());
        item.set_result(ImportResult::new(ImportStatus::Inserted));
        assert!(item.data_changed());
        item.set_result(ImportResult::new(ImportStatus::Unchanged));
        assert!(!item.data_changed());
    }

    proptest! {
        #[test]
        fn identity_ignores_payload(id in 0usize..1000, a in ".*", b in ".*", changed in any::<bool>()) {
            let first = ImportItem::new(id, a, ImportInstructions::new());
            let mut second = ImportItem::new(id, b, ImportInstructions::new().with_merge(true));
            if changed {
                second.set_result(ImportResult::new(ImportStatus::Updated));
            }
            prop_assert_eq!(&first, &second);

            let set: HashSet<_> = [first, second].into_iter().collect();
            prop_assert_eq!(set.len(), 1);
        }

        #[test]
        fn different_ids_are_different_items(a in 0usize..1000, b in 0usize..1000) {
            let first = ImportItem::new(a, (), ImportInstructions::new());
            let second = ImportItem::new(b, (), ImportInstructions::new());
            prop_assert_eq!(first == second, a == b);
        }
    }
}
