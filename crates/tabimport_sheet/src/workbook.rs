//! Tabular document with scoped lifecycle.

use crate::cell::CellValue;
use crate::config::SheetOptions;
use crate::error::{SheetError, SheetResult};
use fs2::FileExt;
use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Anything that designates a column: an index or a header name.
pub trait ColumnRef {
    /// Resolves to a column index.
    fn resolve(&self, workbook: &Workbook) -> SheetResult<usize>;
}

impl ColumnRef for usize {
    fn resolve(&self, _workbook: &Workbook) -> SheetResult<usize> {
        Ok(*self)
    }
}

impl ColumnRef for &str {
    fn resolve(&self, workbook: &Workbook) -> SheetResult<usize> {
        workbook.column_index(self)
    }
}

impl ColumnRef for &String {
    fn resolve(&self, workbook: &Workbook) -> SheetResult<usize> {
        workbook.column_index(self)
    }
}

enum Source {
    File { path: PathBuf, writable: bool },
    Stream(Option<Box<dyn Read + Send>>),
}

struct OpenDocument {
    rows: Vec<Vec<CellValue>>,
    columns: HashMap<String, usize>,
    dirty: bool,
    handle: Option<File>,
}

/// A single-sheet tabular document.
///
/// Row 0 is the header row naming the columns; data rows start at 1. Row
/// and column indices are physical positions in the sheet.
///
/// # Lifecycle
///
/// A workbook is created closed, then `open`ed and `close`d explicitly (or
/// through [`Workbook::scoped`]). Every cell operation on a closed workbook
/// fails with [`SheetError::DocumentClosed`]. While a file-backed workbook is
/// open it holds an advisory lock on the file: exclusive when writable,
/// shared otherwise.
///
/// `close` flushes pending changes of a writable document, then releases the
/// document and its lock. The release happens even when the flush fails; the
/// failure is reported as [`SheetError::Close`].
/// Dropping an open workbook closes it and logs any error.
///
/// # Example
///
/// ```no_run
/// use tabimport_sheet::Workbook;
///
/// let mut sheet = Workbook::from_path("people.csv").unwrap();
/// sheet.scoped(|sheet| {
///     let name = sheet.read_string(1, "NAME")?;
///     sheet.write_string(1, "NAME", name.as_deref().map(str::trim))?;
///     Ok(())
/// }).unwrap();
/// ```
pub struct Workbook {
    source: Source,
    options: SheetOptions,
    doc: Option<OpenDocument>,
}

impl Workbook {
    /// Creates a workbook backed by a file, with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> SheetResult<Self> {
        Self::from_path_with(path, SheetOptions::default())
    }

    /// Creates a workbook backed by a file.
    ///
    /// The workbook is writable if the file is writable and the options are
    /// not read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn from_path_with(path: impl AsRef<Path>, options: SheetOptions) -> SheetResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SheetError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let metadata = File::open(path)
            .and_then(|file| file.metadata())
            .map_err(|_| SheetError::NotReadable {
                path: path.to_path_buf(),
            })?;
        let writable = !options.read_only && !metadata.permissions().readonly();

        Ok(Self {
            source: Source::File {
                path: path.to_path_buf(),
                writable,
            },
            options,
            doc: None,
        })
    }

    /// Creates a read-only workbook from a stream, with default options.
    ///
    /// The stream is consumed by the first `open`.
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self::from_reader_with(reader, SheetOptions::default())
    }

    /// Creates a read-only workbook from a stream.
    pub fn from_reader_with(reader: impl Read + Send + 'static, options: SheetOptions) -> Self {
        Self {
            source: Source::Stream(Some(Box::new(reader))),
            options,
            doc: None,
        }
    }

    /// Returns the options.
    pub fn options(&self) -> &SheetOptions {
        &self.options
    }

    /// Returns the backing file path, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File { path, .. } => Some(path),
            Source::Stream(_) => None,
        }
    }

    /// Returns true if changes are written back on close.
    pub fn is_writable(&self) -> bool {
        matches!(self.source, Source::File { writable: true, .. })
    }

    /// Returns true if the workbook is open.
    pub fn is_open(&self) -> bool {
        self.doc.is_some()
    }

    /// Returns true if the open document has unflushed changes.
    pub fn is_dirty(&self) -> bool {
        self.doc.as_ref().is_some_and(|doc| doc.dirty)
    }

    /// Opens the workbook and loads every row.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The workbook is already open
    /// - The file vanished, cannot be read, or is locked by another process
    /// - A stream source was already consumed
    /// - The content is not valid delimited text
    pub fn open(&mut self) -> SheetResult<()> {
        if self.doc.is_some() {
            return Err(SheetError::DocumentOpen);
        }

        let delimiter = self.options.delimiter;
        let (rows, handle) = match &mut self.source {
            Source::File { path, writable } => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(*writable)
                    .open(&*path)
                    .map_err(|e| match e.kind() {
                        io::ErrorKind::NotFound => SheetError::FileNotFound { path: path.clone() },
                        io::ErrorKind::PermissionDenied => {
                            SheetError::NotReadable { path: path.clone() }
                        }
                        _ => SheetError::Io(e),
                    })?;

                let locked = if *writable {
                    FileExt::try_lock_exclusive(&file)
                } else {
                    FileExt::try_lock_shared(&file)
                };
                if locked.is_err() {
                    return Err(SheetError::Locked { path: path.clone() });
                }

                (read_rows(&file, delimiter)?, Some(file))
            }
            Source::Stream(reader) => {
                let reader = reader.take().ok_or(SheetError::SourceConsumed)?;
                (read_rows(reader, delimiter)?, None)
            }
        };

        let mut columns = HashMap::new();
        if let Some(header) = rows.first() {
            for (index, cell) in header.iter().enumerate() {
                if let Some(name) = cell.as_text() {
                    columns.entry(name.trim().to_string()).or_insert(index);
                }
            }
        }

        tracing::debug!(
            path = ?self.path(),
            rows = rows.len(),
            columns = columns.len(),
            "opened document"
        );

        self.doc = Some(OpenDocument {
            rows,
            columns,
            dirty: false,
            handle,
        });
        Ok(())
    }

    /// Closes the workbook, flushing pending changes if writable.
    ///
    /// The document is released even when flushing fails.
    ///
    /// # Errors
    ///
    /// Returns `DocumentClosed` if not open, or `Close` wrapping the first
    /// flush/unlock failure.
    pub fn close(&mut self) -> SheetResult<()> {
        let doc = self.doc.take().ok_or(SheetError::DocumentClosed)?;

        let flushed = if self.is_writable() && doc.dirty {
            write_rows(&doc, self.options.delimiter)
        } else {
            Ok(())
        };
        let released = match &doc.handle {
            Some(file) => FileExt::unlock(file).map_err(SheetError::from),
            None => Ok(()),
        };
        let rows = doc.rows.len();
        drop(doc);

        tracing::debug!(path = ?self.path(), rows, "closed document");
        flushed.and(released).map_err(SheetError::close)
    }

    /// Writes pending changes without closing.
    ///
    /// # Errors
    ///
    /// Returns an error if the workbook is closed, read-only, or the write fails.
    pub fn flush(&mut self) -> SheetResult<()> {
        if !self.is_writable() {
            return Err(SheetError::ReadOnly);
        }
        let delimiter = self.options.delimiter;
        let doc = self.doc.as_mut().ok_or(SheetError::DocumentClosed)?;
        if doc.dirty {
            write_rows(doc, delimiter)?;
            doc.dirty = false;
        }
        Ok(())
    }

    /// Runs `f` between `open` and `close`.
    ///
    /// `close` runs on every exit path. An error from `f` takes precedence
    /// over a close error, which is then only logged.
    pub fn scoped<T, F>(&mut self, f: F) -> SheetResult<T>
    where
        F: FnOnce(&mut Self) -> SheetResult<T>,
    {
        self.open()?;
        let result = f(self);
        let closed = self.close();

        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::warn!(error = %close_err, "close failed after earlier error");
                Err(e)
            }
        }
    }

    fn doc(&self) -> SheetResult<&OpenDocument> {
        self.doc.as_ref().ok_or(SheetError::DocumentClosed)
    }

    /// Returns the number of rows, header included.
    pub fn row_count(&self) -> SheetResult<usize> {
        Ok(self.doc()?.rows.len())
    }

    /// Returns the number of columns named by the header row.
    pub fn column_count(&self) -> SheetResult<usize> {
        Ok(self.doc()?.rows.first().map_or(0, Vec::len))
    }

    /// Returns the header names in column order (blank headers as empty strings).
    pub fn headers(&self) -> SheetResult<Vec<String>> {
        Ok(self
            .doc()?
            .rows
            .first()
            .map(|header| header.iter().map(CellValue::to_field).collect())
            .unwrap_or_default())
    }

    /// Resolves a header name to its column index.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if no header carries the name.
    pub fn column_index(&self, name: &str) -> SheetResult<usize> {
        self.doc()?
            .columns
            .get(name)
            .copied()
            .ok_or_else(|| SheetError::unknown_column(name))
    }

    /// Returns true if a header carries the name.
    pub fn has_column(&self, name: &str) -> SheetResult<bool> {
        Ok(self.doc()?.columns.contains_key(name))
    }

    /// Returns the cell at (`row`, `column`).
    ///
    /// # Errors
    ///
    /// Returns an error if the workbook is closed or the cell does not exist.
    pub fn cell(&self, row: usize, column: impl ColumnRef) -> SheetResult<&CellValue> {
        let column = column.resolve(self)?;
        let cells = self
            .doc()?
            .rows
            .get(row)
            .ok_or(SheetError::MissingRow { row })?;
        cells
            .get(column)
            .ok_or(SheetError::MissingCell { row, column })
    }

    /// Replaces the cell content, reporting whether it changed.
    pub fn set_cell(&mut self, row: usize, column: impl ColumnRef, value: CellValue) -> SheetResult<bool> {
        let column = column.resolve(self)?;
        let changed = *self.cell(row, column)? != value;
        if changed {
            self.put(row, column, value)?;
        }
        Ok(changed)
    }

    /// Stores a value in an existing cell and marks the document dirty.
    pub(crate) fn put(&mut self, row: usize, column: usize, value: CellValue) -> SheetResult<()> {
        let doc = self.doc.as_mut().ok_or(SheetError::DocumentClosed)?;
        let slot = doc
            .rows
            .get_mut(row)
            .ok_or(SheetError::MissingRow { row })?
            .get_mut(column)
            .ok_or(SheetError::MissingCell { row, column })?;
        *slot = value;
        doc.dirty = true;
        Ok(())
    }
}

impl Drop for Workbook {
    fn drop(&mut self) {
        if self.doc.is_some() {
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "failed to close document on drop");
            }
        }
    }
}

impl fmt::Debug for Workbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workbook")
            .field("path", &self.path())
            .field("writable", &self.is_writable())
            .field("open", &self.is_open())
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

fn read_rows(reader: impl Read, delimiter: u8) -> SheetResult<Vec<Vec<CellValue>>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::from_field).collect::<Vec<_>>());
    }

    // Every row spans at least the header
    let width = rows.first().map_or(0, Vec::len);
    for row in &mut rows {
        if row.len() < width {
            row.resize(width, CellValue::Blank);
        }
    }
    Ok(rows)
}

fn write_rows(doc: &OpenDocument, delimiter: u8) -> SheetResult<()> {
    let mut file: &File = doc.handle.as_ref().ok_or(SheetError::ReadOnly)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;

    let mut csv = csv::WriterBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);
    for row in &doc.rows {
        csv.write_record(row.iter().map(CellValue::to_field))?;
    }
    csv.flush()?;
    drop(csv);

    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const PEOPLE: &str = "ID,NAME,AGE\n1,Alice,30\n2,Bob\n";

    fn temp_sheet(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file() {
        let err = Workbook::from_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, SheetError::FileNotFound { .. }));
    }

    #[test]
    fn closed_workbook_rejects_access() {
        let (_dir, path) = temp_sheet(PEOPLE);
        let workbook = Workbook::from_path(&path).unwrap();
        assert!(matches!(workbook.cell(1, 0), Err(SheetError::DocumentClosed)));
        assert!(matches!(workbook.row_count(), Err(SheetError::DocumentClosed)));
    }

    #[test]
    fn open_twice_fails() {
        let (_dir, path) = temp_sheet(PEOPLE);
        let mut workbook = Workbook::from_path(&path).unwrap();
        workbook.open().unwrap();
        assert!(matches!(workbook.open(), Err(SheetError::DocumentOpen)));
        workbook.close().unwrap();
        assert!(matches!(workbook.close(), Err(SheetError::DocumentClosed)));
    }

    #[test]
    fn header_lookup_and_padding() {
        let (_dir, path) = temp_sheet(PEOPLE);
        let mut workbook = Workbook::from_path(&path).unwrap();
        workbook.open().unwrap();

        assert_eq!(workbook.row_count().unwrap(), 3);
        assert_eq!(workbook.headers().unwrap(), vec!["ID", "NAME", "AGE"]);
        assert_eq!(workbook.column_index("AGE").unwrap(), 2);
        assert!(workbook.has_column("NAME").unwrap());
        assert!(matches!(
            workbook.column_index("EMAIL"),
            Err(SheetError::UnknownColumn { .. })
        ));

        // Short row padded with blanks
        assert_eq!(workbook.cell(2, "AGE").unwrap(), &CellValue::Blank);
        assert!(matches!(workbook.cell(9, 0), Err(SheetError::MissingRow { row: 9 })));
        assert!(matches!(
            workbook.cell(1, 7),
            Err(SheetError::MissingCell { row: 1, column: 7 })
        ));

        workbook.close().unwrap();
    }

    #[test]
    fn close_flushes_changes() {
        let (_dir, path) = temp_sheet(PEOPLE);
        let mut workbook = Workbook::from_path(&path).unwrap();

        workbook
            .scoped(|wb| {
                wb.set_cell(1, "NAME", CellValue::Text("Alicia".into()))?;
                Ok(())
            })
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "ID,NAME,AGE\n1,Alicia,30\n2,Bob,\n");
    }

    #[test]
    fn unchanged_document_is_not_rewritten() {
        let (_dir, path) = temp_sheet(PEOPLE);
        let mut workbook = Workbook::from_path(&path).unwrap();

        workbook
            .scoped(|wb| {
                let changed = wb.set_cell(1, "NAME", CellValue::Text("Alice".into()))?;
                assert!(!changed);
                assert!(!wb.is_dirty());
                Ok(())
            })
            .unwrap();

        // Original ragged row survives untouched
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PEOPLE);
    }

    #[test]
    fn read_only_options_never_write() {
        let (_dir, path) = temp_sheet(PEOPLE);
        let mut workbook =
            Workbook::from_path_with(&path, SheetOptions::new().read_only(true)).unwrap();
        assert!(!workbook.is_writable());

        workbook.open().unwrap();
        workbook
            .set_cell(1, "NAME", CellValue::Text("Changed".into()))
            .unwrap();
        assert!(matches!(workbook.flush(), Err(SheetError::ReadOnly)));
        workbook.close().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), PEOPLE);
    }

    #[test]
    fn stream_source_is_single_use() {
        let mut workbook = Workbook::from_reader(Cursor::new(PEOPLE.as_bytes().to_vec()));
        assert!(!workbook.is_writable());

        workbook.open().unwrap();
        assert_eq!(workbook.row_count().unwrap(), 3);
        workbook.close().unwrap();

        assert!(matches!(workbook.open(), Err(SheetError::SourceConsumed)));
    }

    #[test]
    fn scoped_closes_on_error() {
        let (_dir, path) = temp_sheet(PEOPLE);
        let mut workbook = Workbook::from_path(&path).unwrap();

        let result: SheetResult<()> = workbook.scoped(|wb| {
            wb.set_cell(1, "NAME", CellValue::Text("Partial".into()))?;
            wb.cell(1, "MISSING").map(|_| ())
        });

        assert!(matches!(result, Err(SheetError::UnknownColumn { .. })));
        assert!(!workbook.is_open());
        // Changes made before the failure are still flushed on close
        assert!(std::fs::read_to_string(&path).unwrap().contains("Partial"));
    }

    #[test]
    fn drop_closes_open_document() {
        let (_dir, path) = temp_sheet(PEOPLE);
        {
            let mut workbook = Workbook::from_path(&path).unwrap();
            workbook.open().unwrap();
            workbook
                .set_cell(2, "AGE", CellValue::Number(41.0))
                .unwrap();
        }
        assert!(std::fs::read_to_string(&path).unwrap().contains("2,Bob,41"));

        // Lock was released: the file can be opened again
        let mut workbook = Workbook::from_path(&path).unwrap();
        workbook.open().unwrap();
        workbook.close().unwrap();
    }

    #[test]
    fn read_only_documents_share_the_lock() {
        let (_dir, path) = temp_sheet(PEOPLE);
        let read_only = || Workbook::from_path_with(&path, SheetOptions::new().read_only(true)).unwrap();

        let mut first = read_only();
        let mut second = read_only();
        first.open().unwrap();
        second.open().unwrap();

        let mut writer = Workbook::from_path(&path).unwrap();
        assert!(matches!(writer.open(), Err(SheetError::Locked { .. })));

        first.close().unwrap();
        second.close().unwrap();
        writer.open().unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn failed_flush_still_releases() {
        let (_dir, path) = temp_sheet(PEOPLE);
        let mut workbook = Workbook::from_path(&path).unwrap();
        workbook.open().unwrap();
        workbook
            .set_cell(2, "AGE", CellValue::Number(41.0))
            .unwrap();

        // A handle without write access makes the truncate fail
        let doc = workbook.doc.as_mut().unwrap();
        doc.handle = Some(File::open(&path).unwrap());

        let err = workbook.close().unwrap_err();
        match err {
            SheetError::Close { source } => assert!(matches!(*source, SheetError::Io(_))),
            other => panic!("expected Close, got {other:?}"),
        }
        assert!(!workbook.is_open());
        assert!(matches!(workbook.close(), Err(SheetError::DocumentClosed)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PEOPLE);

        let mut again = Workbook::from_path(&path).unwrap();
        again.open().unwrap();
        again.close().unwrap();
    }

    #[test]
    fn semicolon_delimiter() {
        let (_dir, path) = temp_sheet("ID;NAME\n1;Ana\n");
        let mut workbook =
            Workbook::from_path_with(&path, SheetOptions::new().delimiter(b';')).unwrap();
        workbook.open().unwrap();
        assert_eq!(workbook.cell(1, "NAME").unwrap(), &CellValue::Text("Ana".into()));
        workbook.close().unwrap();
    }
}
