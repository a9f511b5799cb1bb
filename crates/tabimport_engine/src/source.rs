//! Record source contract.

use crate::error::EngineResult;
use crate::item::ImportItem;
use std::iter::FusedIterator;

/// Forward-only cursor over source records, with write-back.
///
/// A source is opened, walked with [`next`](DataSource::next) until it
/// reports the end, then closed. The walk is finite and cannot be
/// restarted without reopening.
///
/// # Errors
///
/// Every operation other than `open` fails while the source is closed.
///
/// # Implementors
///
/// - [`SheetDataSource`](crate::SheetDataSource) - Rows of a tabular document
pub trait DataSource {
    /// Item identifier type.
    type Id;
    /// Payload type.
    type Data;

    /// Acquires the underlying document.
    fn open(&mut self) -> EngineResult<()>;

    /// Flushes pending write-backs (if writable) and releases the document.
    ///
    /// Resources are released even when flushing fails.
    fn close(&mut self) -> EngineResult<()>;

    /// Returns the item at the cursor without advancing.
    ///
    /// # Errors
    ///
    /// Returns `CursorNotPositioned` before the first `next`.
    fn current(&self) -> EngineResult<&ImportItem<Self::Id, Self::Data>>;

    /// Advances the cursor and materializes the next item, `None` at the end.
    fn next(&mut self) -> EngineResult<Option<ImportItem<Self::Id, Self::Data>>>;

    /// Writes `item`'s payload into the record at the cursor.
    ///
    /// Returns the item as now stored, with the columns that really changed.
    fn sync(
        &mut self,
        item: &ImportItem<Self::Id, Self::Data>,
    ) -> EngineResult<SyncReport<Self::Id, Self::Data>>;

    /// Iterates over the remaining items.
    ///
    /// The iterator stops after the first error.
    fn items(&mut self) -> Items<'_, Self>
    where
        Self: Sized,
    {
        Items {
            source: self,
            done: false,
        }
    }
}

/// Outcome of a write-back.
#[derive(Debug, Clone)]
pub struct SyncReport<I, T> {
    /// The item re-read from the record.
    pub item: ImportItem<I, T>,
    /// Columns whose content changed, in write order.
    pub changed_columns: Vec<String>,
}

impl<I, T> SyncReport<I, T> {
    /// Returns true if any column changed.
    pub fn is_changed(&self) -> bool {
        !self.changed_columns.is_empty()
    }
}

/// Iterator returned by [`DataSource::items`].
#[derive(Debug)]
pub struct Items<'a, S> {
    source: &'a mut S,
    done: bool,
}

impl<S: DataSource> Iterator for Items<'_, S> {
    type Item = EngineResult<ImportItem<S::Id, S::Data>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.source.next().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

impl<S: DataSource> FusedIterator for Items<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::instructions::ImportInstructions;
    use tabimport_sheet::SheetError;

    /// In-memory source over a list of strings.
    struct VecSource {
        rows: Vec<&'static str>,
        open: bool,
        cursor: Option<usize>,
        current: Option<ImportItem<usize, String>>,
    }

    impl VecSource {
        fn new(rows: Vec<&'static str>) -> Self {
            Self {
                rows,
                open: false,
                cursor: None,
                current: None,
            }
        }
    }

    impl DataSource for VecSource {
        type Id = usize;
        type Data = String;

        fn open(&mut self) -> EngineResult<()> {
            self.open = true;
            Ok(())
        }

        fn close(&mut self) -> EngineResult<()> {
            self.open = false;
            Ok(())
        }

        fn current(&self) -> EngineResult<&ImportItem<usize, String>> {
            if !self.open {
                return Err(SheetError::DocumentClosed.into());
            }
            self.current.as_ref().ok_or(EngineError::CursorNotPositioned)
        }

        fn next(&mut self) -> EngineResult<Option<ImportItem<usize, String>>> {
            let row = self.cursor.map_or(0, |r| r + 1);
            self.cursor = Some(row);
            if self.rows.get(row) == Some(&"boom") {
                return Err(EngineError::missing("row"));
            }
            self.current = self
                .rows
                .get(row)
                .map(|s| ImportItem::new(row, s.to_string(), ImportInstructions::new()));
            Ok(self.current.clone())
        }

        fn sync(&mut self, item: &ImportItem<usize, String>) -> EngineResult<SyncReport<usize, String>> {
            Ok(SyncReport {
                item: item.clone(),
                changed_columns: Vec::new(),
            })
        }
    }

    #[test]
    fn items_walks_every_row() {
        let mut source = VecSource::new(vec!["a", "b", "c"]);
        assert!(matches!(source.current(), Err(EngineError::Sheet(_))));
        source.open().unwrap();
        assert!(matches!(source.current(), Err(EngineError::CursorNotPositioned)));

        let data: Vec<String> = source
            .items()
            .map(|item| item.unwrap().into_data())
            .collect();
        assert_eq!(data, vec!["a", "b", "c"]);
    }

    #[test]
    fn items_stops_after_error() {
        let mut source = VecSource::new(vec!["a", "boom", "c"]);
        source.open().unwrap();

        let mut items = source.items();
        assert!(items.next().unwrap().is_ok());
        assert!(items.next().unwrap().is_err());
        assert!(items.next().is_none());
    }
}
