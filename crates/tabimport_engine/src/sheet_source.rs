//! Record source over the rows of a tabular document.

use crate::config::{ColumnLayout, ImportConfig};
use crate::error::{EngineError, EngineResult};
use crate::instructions::ImportInstructions;
use crate::item::ImportItem;
use crate::source::{DataSource, SyncReport};
use tabimport_entity::{AuditInfo, Entity};
use tabimport_sheet::{SheetError, SheetResult, Workbook};
use uuid::Uuid;

type MapperId<M> = <<M as RowMapper>::Entity as Entity>::Id;

/// Integrator-supplied mapping between one row and one entity.
///
/// The source owns the identifier, audit and instruction columns (see
/// [`ColumnLayout`]); the mapper owns every payload column.
///
/// # Example
///
/// ```rust
/// use tabimport_engine::{CellId, RowChanges, RowMapper};
/// use tabimport_entity::{AuditInfo, Entity};
/// use tabimport_sheet::{SheetResult, Workbook};
///
/// #[derive(Debug, Clone, Default)]
/// struct City { id: Option<i64>, name: Option<String>, audit: AuditInfo }
///
/// # impl Entity for City {
/// #     type Id = i64;
/// #     const KIND: &'static str = "city";
/// #     fn id(&self) -> Option<&i64> { self.id.as_ref() }
/// #     fn set_id(&mut self, id: Option<i64>) { self.id = id; }
/// #     fn audit(&self) -> &AuditInfo { &self.audit }
/// #     fn audit_mut(&mut self) -> &mut AuditInfo { &mut self.audit }
/// #     fn same_content(&self, other: &Self) -> bool { self.name == other.name }
/// #     fn merge_from(&mut self, _: &Self) -> Vec<String> { Vec::new() }
/// #     fn replace_from(&mut self, source: &Self) { self.name = source.name.clone(); }
/// # }
/// struct CityMapper;
///
/// impl RowMapper for CityMapper {
///     type Entity = City;
///
///     fn create_entity_instance(&self) -> City {
///         City::default()
///     }
///
///     fn read_entity_id(&self, sheet: &Workbook, row: usize, column: &str) -> SheetResult<Option<i64>> {
///         i64::read_cell(sheet, row, column)
///     }
///
///     fn write_entity_id(&self, sheet: &mut Workbook, row: usize, column: &str, id: &i64) -> SheetResult<bool> {
///         id.write_cell(sheet, row, column)
///     }
///
///     fn read_item_data(&self, sheet: &Workbook, row: usize, city: &mut City) -> SheetResult<()> {
///         city.name = sheet.read_string(row, "NAME")?;
///         Ok(())
///     }
///
///     fn write_item_data(
///         &self,
///         sheet: &mut Workbook,
///         row: usize,
///         city: &City,
///         changes: &mut RowChanges,
///     ) -> SheetResult<()> {
///         changes.track("NAME", sheet.write_string(row, "NAME", city.name.as_deref())?);
///         Ok(())
///     }
/// }
/// ```
pub trait RowMapper {
    /// Entity produced from a row.
    type Entity: Entity;

    /// Creates an empty entity to be filled from a row.
    fn create_entity_instance(&self) -> Self::Entity;

    /// Reads the entity identifier from the identifier column.
    fn read_entity_id(
        &self,
        sheet: &Workbook,
        row: usize,
        column: &str,
    ) -> SheetResult<Option<MapperId<Self>>>;

    /// Writes the entity identifier, reporting whether the cell changed.
    fn write_entity_id(
        &self,
        sheet: &mut Workbook,
        row: usize,
        column: &str,
        id: &MapperId<Self>,
    ) -> SheetResult<bool>;

    /// Fills the payload fields of `entity` from the row.
    fn read_item_data(&self, sheet: &Workbook, row: usize, entity: &mut Self::Entity) -> SheetResult<()>;

    /// Writes the payload fields into the row, tracking the cells that changed.
    fn write_item_data(
        &self,
        sheet: &mut Workbook,
        row: usize,
        entity: &Self::Entity,
        changes: &mut RowChanges,
    ) -> SheetResult<()>;
}

/// Identifier types that live in a single cell.
pub trait CellId: Sized {
    /// Reads the identifier, `None` when the cell is blank.
    fn read_cell(sheet: &Workbook, row: usize, column: &str) -> SheetResult<Option<Self>>;

    /// Writes the identifier, reporting whether the cell changed.
    fn write_cell(&self, sheet: &mut Workbook, row: usize, column: &str) -> SheetResult<bool>;
}

impl CellId for i64 {
    fn read_cell(sheet: &Workbook, row: usize, column: &str) -> SheetResult<Option<Self>> {
        sheet.read_i64(row, column)
    }

    fn write_cell(&self, sheet: &mut Workbook, row: usize, column: &str) -> SheetResult<bool> {
        sheet.write_i64(row, column, Some(*self))
    }
}

impl CellId for i32 {
    fn read_cell(sheet: &Workbook, row: usize, column: &str) -> SheetResult<Option<Self>> {
        sheet.read_i32(row, column)
    }

    fn write_cell(&self, sheet: &mut Workbook, row: usize, column: &str) -> SheetResult<bool> {
        sheet.write_i32(row, column, Some(*self))
    }
}

impl CellId for String {
    fn read_cell(sheet: &Workbook, row: usize, column: &str) -> SheetResult<Option<Self>> {
        sheet.read_string(row, column)
    }

    fn write_cell(&self, sheet: &mut Workbook, row: usize, column: &str) -> SheetResult<bool> {
        sheet.write_string(row, column, Some(self))
    }
}

impl CellId for Uuid {
    fn read_cell(sheet: &Workbook, row: usize, column: &str) -> SheetResult<Option<Self>> {
        let Some(text) = sheet.read_string(row, column)? else {
            return Ok(None);
        };
        match Uuid::parse_str(text.trim()) {
            Ok(id) => Ok(Some(id)),
            Err(_) => Err(SheetError::format(row, sheet.column_index(column)?, "UUID", text)),
        }
    }

    fn write_cell(&self, sheet: &mut Workbook, row: usize, column: &str) -> SheetResult<bool> {
        sheet.write_string(row, column, Some(&self.to_string()))
    }
}

/// Names of the cells a write-back really changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowChanges {
    columns: Vec<String>,
}

impl RowChanges {
    /// Creates an empty change list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `column` if `changed`, passing the flag through.
    pub fn track(&mut self, column: &str, changed: bool) -> bool {
        if changed {
            self.columns.push(column.to_string());
        }
        changed
    }

    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the changed columns in write order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Consumes the list.
    pub fn into_columns(self) -> Vec<String> {
        self.columns
    }
}

/// Rows of a [`Workbook`] presented as import items.
///
/// Row 0 is the header. Each following non-blank row becomes one
/// [`ImportItem`] whose identifier is the row index. The entity identifier
/// and audit block come from the [`ColumnLayout`] columns when present, the
/// payload from the [`RowMapper`]. Instructions are read from the
/// instruction columns as yes/no flags (blank means no); a sheet with no
/// instruction column at all uses the configured default instructions.
pub struct SheetDataSource<M: RowMapper> {
    sheet: Workbook,
    mapper: M,
    layout: ColumnLayout,
    default_instructions: ImportInstructions,
    cursor: Option<usize>,
    current: Option<ImportItem<usize, M::Entity>>,
}

impl<M: RowMapper> SheetDataSource<M> {
    /// Creates a source with the default layout and no default instructions.
    pub fn new(sheet: Workbook, mapper: M) -> Self {
        Self {
            sheet,
            mapper,
            layout: ColumnLayout::default(),
            default_instructions: ImportInstructions::new(),
            cursor: None,
            current: None,
        }
    }

    /// Creates a source using the layout and default instructions of `config`.
    pub fn with_config(sheet: Workbook, mapper: M, config: &ImportConfig) -> Self {
        Self::new(sheet, mapper)
            .with_layout(config.layout.clone())
            .with_default_instructions(config.default_instructions)
    }

    /// Sets the column layout.
    #[must_use]
    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the instructions used when the sheet has no instruction column.
    #[must_use]
    pub fn with_default_instructions(mut self, instructions: ImportInstructions) -> Self {
        self.default_instructions = instructions;
        self
    }

    /// Returns the underlying document.
    pub fn sheet(&self) -> &Workbook {
        &self.sheet
    }

    /// Returns the row mapper.
    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Returns the column layout.
    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Consumes the source, returning document and mapper.
    pub fn into_parts(self) -> (Workbook, M) {
        (self.sheet, self.mapper)
    }

    fn position(&self) -> EngineResult<usize> {
        if !self.sheet.is_open() {
            return Err(SheetError::DocumentClosed.into());
        }
        self.current
            .as_ref()
            .map(|item| *item.id())
            .ok_or(EngineError::CursorNotPositioned)
    }

    fn is_blank_row(&self, row: usize) -> SheetResult<bool> {
        for column in 0..self.sheet.column_count()? {
            if !self.sheet.cell(row, column)?.is_blank() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn materialize(&self, row: usize) -> EngineResult<ImportItem<usize, M::Entity>> {
        let mut entity = self.mapper.create_entity_instance();
        let id = if self.sheet.has_column(&self.layout.id)? {
            self.mapper.read_entity_id(&self.sheet, row, &self.layout.id)?
        } else {
            None
        };
        entity.set_id(id);
        *entity.audit_mut() = self.read_audit(row)?;
        self.mapper.read_item_data(&self.sheet, row, &mut entity)?;

        let instructions = self.read_instructions(row)?;
        Ok(ImportItem::new(row, entity, instructions))
    }

    fn read_audit(&self, row: usize) -> SheetResult<AuditInfo> {
        let layout = &self.layout;
        let mut audit = AuditInfo::new();
        if self.sheet.has_column(&layout.creation_date)? {
            audit.creation_date = self.sheet.read_date(row, &layout.creation_date)?;
        }
        if self.sheet.has_column(&layout.update_date)? {
            audit.update_date = self.sheet.read_date(row, &layout.update_date)?;
        }
        if self.sheet.has_column(&layout.version)? {
            audit.version = self.sheet.read_i64(row, &layout.version)?;
        }
        Ok(audit)
    }

    fn read_instructions(&self, row: usize) -> SheetResult<ImportInstructions> {
        let mut present = false;
        let mut flags = [false; 6];
        for (flag, column) in flags.iter_mut().zip(self.layout.instruction_columns()) {
            if self.sheet.has_column(column)? {
                present = true;
                *flag = self.sheet.read_yes_no(row, column)?.unwrap_or(false);
            }
        }
        if !present {
            return Ok(self.default_instructions);
        }

        let [insert, update, merge, remove, force, sync] = flags;
        Ok(ImportInstructions::new()
            .with_insert(insert)
            .with_update(update)
            .with_merge(merge)
            .with_remove(remove)
            .with_force(force)
            .with_sync(sync))
    }

    fn write_audit(&mut self, row: usize, audit: &AuditInfo, changes: &mut RowChanges) -> SheetResult<()> {
        let layout = &self.layout;
        if self.sheet.has_column(&layout.creation_date)? {
            let changed = self.sheet.write_date(row, &layout.creation_date, audit.creation_date)?;
            changes.track(&layout.creation_date, changed);
        }
        if self.sheet.has_column(&layout.update_date)? {
            let changed = self.sheet.write_date(row, &layout.update_date, audit.update_date)?;
            changes.track(&layout.update_date, changed);
        }
        if self.sheet.has_column(&layout.version)? {
            let changed = self.sheet.write_i64(row, &layout.version, audit.version)?;
            changes.track(&layout.version, changed);
        }
        Ok(())
    }
}

impl<M: RowMapper> DataSource for SheetDataSource<M> {
    type Id = usize;
    type Data = M::Entity;

    fn open(&mut self) -> EngineResult<()> {
        self.sheet.open()?;
        self.cursor = None;
        self.current = None;
        Ok(())
    }

    fn close(&mut self) -> EngineResult<()> {
        self.cursor = None;
        self.current = None;
        self.sheet.close()?;
        Ok(())
    }

    fn current(&self) -> EngineResult<&ImportItem<usize, M::Entity>> {
        if !self.sheet.is_open() {
            return Err(SheetError::DocumentClosed.into());
        }
        self.current.as_ref().ok_or(EngineError::CursorNotPositioned)
    }

    fn next(&mut self) -> EngineResult<Option<ImportItem<usize, M::Entity>>> {
        let rows = self.sheet.row_count()?;
        let mut row = self.cursor.map_or(1, |r| r + 1);
        while row < rows && self.is_blank_row(row)? {
            row += 1;
        }

        if row >= rows {
            self.cursor = Some(rows);
            self.current = None;
            return Ok(None);
        }

        let item = self.materialize(row)?;
        tracing::debug!(
            row,
            id = ?item.data().id(),
            instructions = %item.instructions(),
            "materialized row"
        );
        self.cursor = Some(row);
        self.current = Some(item.clone());
        Ok(Some(item))
    }

    fn sync(
        &mut self,
        item: &ImportItem<usize, M::Entity>,
    ) -> EngineResult<SyncReport<usize, M::Entity>> {
        let row = self.position()?;
        let entity = item.data();
        let mut changes = RowChanges::new();

        // Identifier first, only into an existing column that does not already hold it
        let id = match entity.id() {
            Some(id) if self.sheet.has_column(&self.layout.id)? => Some(id),
            _ => None,
        };
        if let Some(id) = id {
            let stored = self.mapper.read_entity_id(&self.sheet, row, &self.layout.id)?;
            if stored.as_ref() != Some(id) {
                let changed = self
                    .mapper
                    .write_entity_id(&mut self.sheet, row, &self.layout.id, id)?;
                changes.track(&self.layout.id, changed);
            }
        }
        self.write_audit(row, entity.audit(), &mut changes)?;
        self.mapper
            .write_item_data(&mut self.sheet, row, entity, &mut changes)?;

        let mut refreshed = self.materialize(row)?;
        refreshed.set_result(item.result().clone());
        tracing::debug!(row, changed = ?changes.columns(), "synchronized row");

        self.current = Some(refreshed.clone());
        Ok(SyncReport {
            item: refreshed,
            changed_columns: changes.into_columns(),
        })
    }
}
