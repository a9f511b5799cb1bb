//! Test fixtures: a sample entity, its row mapper and temporary sheets.
//!
//! `Person` carries one field of each cell family the import pipeline
//! usually meets (text, naive date, yes/no flag) so scenarios can exercise
//! merge and write-back without defining their own entity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tabimport_engine::{CellId, ImportConfig, RowChanges, RowMapper, SheetDataSource};
use tabimport_entity::{AuditInfo, Entity, InMemoryRepository, Repository, SequentialIds};
use tabimport_sheet::{SheetResult, Workbook};
use tempfile::TempDir;

/// Column holding the person's name.
pub const NAME: &str = "NAME";
/// Column holding the e-mail address.
pub const EMAIL: &str = "EMAIL";
/// Column holding the birth date.
pub const BIRTH_DATE: &str = "BIRTH_DATE";
/// Column holding the yes/no active flag.
pub const ACTIVE: &str = "ACTIVE";

/// Sample entity used across the test suites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Identifier assigned by the store.
    pub id: Option<i64>,
    /// Display name.
    pub name: Option<String>,
    /// Contact address.
    pub email: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Whether the person is active.
    pub active: Option<bool>,
    /// Store-managed metadata.
    #[serde(default)]
    pub audit: AuditInfo,
}

impl Person {
    /// Creates an unsaved person with only a name.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Creates a person with an identifier and a name.
    pub fn with_id(id: i64, name: &str) -> Self {
        Self {
            id: Some(id),
            ..Self::named(name)
        }
    }

    /// Sets the e-mail address.
    #[must_use]
    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Sets the stored version.
    #[must_use]
    pub fn version(mut self, version: i64) -> Self {
        self.audit.version = Some(version);
        self
    }
}

impl Entity for Person {
    type Id = i64;
    const KIND: &'static str = "person";

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }

    fn same_content(&self, other: &Self) -> bool {
        self.name == other.name
            && self.email == other.email
            && self.birth_date == other.birth_date
            && self.active == other.active
    }

    fn merge_from(&mut self, source: &Self) -> Vec<String> {
        let mut fields = Vec::new();
        patch(&mut self.name, &source.name, "name", &mut fields);
        patch(&mut self.email, &source.email, "email", &mut fields);
        patch(&mut self.birth_date, &source.birth_date, "birth_date", &mut fields);
        patch(&mut self.active, &source.active, "active", &mut fields);
        fields
    }

    fn replace_from(&mut self, source: &Self) {
        self.name = source.name.clone();
        self.email = source.email.clone();
        self.birth_date = source.birth_date;
        self.active = source.active;
    }
}

fn patch<T: Clone + PartialEq>(
    target: &mut Option<T>,
    source: &Option<T>,
    name: &str,
    fields: &mut Vec<String>,
) {
    if source.is_some() && source != target {
        target.clone_from(source);
        fields.push(name.to_string());
    }
}

/// Row mapper for [`Person`].
///
/// Every payload column is optional; columns absent from the header are
/// neither read nor written.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonMapper;

impl RowMapper for PersonMapper {
    type Entity = Person;

    fn create_entity_instance(&self) -> Person {
        Person::default()
    }

    fn read_entity_id(&self, sheet: &Workbook, row: usize, column: &str) -> SheetResult<Option<i64>> {
        i64::read_cell(sheet, row, column)
    }

    fn write_entity_id(&self, sheet: &mut Workbook, row: usize, column: &str, id: &i64) -> SheetResult<bool> {
        id.write_cell(sheet, row, column)
    }

    fn read_item_data(&self, sheet: &Workbook, row: usize, person: &mut Person) -> SheetResult<()> {
        if sheet.has_column(NAME)? {
            person.name = sheet.read_string(row, NAME)?;
        }
        if sheet.has_column(EMAIL)? {
            person.email = sheet.read_string(row, EMAIL)?;
        }
        if sheet.has_column(BIRTH_DATE)? {
            person.birth_date = sheet.read_day(row, BIRTH_DATE)?;
        }
        if sheet.has_column(ACTIVE)? {
            person.active = sheet.read_yes_no(row, ACTIVE)?;
        }
        Ok(())
    }

    fn write_item_data(
        &self,
        sheet: &mut Workbook,
        row: usize,
        person: &Person,
        changes: &mut RowChanges,
    ) -> SheetResult<()> {
        if sheet.has_column(NAME)? {
            changes.track(NAME, sheet.write_string(row, NAME, person.name.as_deref())?);
        }
        if sheet.has_column(EMAIL)? {
            changes.track(EMAIL, sheet.write_string(row, EMAIL, person.email.as_deref())?);
        }
        if sheet.has_column(BIRTH_DATE)? {
            changes.track(BIRTH_DATE, sheet.write_day(row, BIRTH_DATE, person.birth_date)?);
        }
        if sheet.has_column(ACTIVE)? {
            changes.track(ACTIVE, sheet.write_yes_no(row, ACTIVE, person.active)?);
        }
        Ok(())
    }
}

/// A CSV sheet in a temporary directory, removed on drop.
pub struct TempSheet {
    path: PathBuf,
    _dir: TempDir,
}

impl TempSheet {
    /// Writes `contents` to a fresh `sheet.csv`.
    pub fn new(contents: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, contents).expect("Failed to write sheet");
        Self { path, _dir: dir }
    }

    /// Builds a sheet from a header line and data lines.
    pub fn with_rows(header: &str, rows: &[&str]) -> Self {
        let mut contents = format!("{header}\n");
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        Self::new(&contents)
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current file contents.
    pub fn contents(&self) -> String {
        std::fs::read_to_string(&self.path).expect("Failed to read sheet")
    }

    /// Creates an unopened workbook over the file.
    pub fn workbook(&self) -> Workbook {
        Workbook::from_path(&self.path).expect("Failed to create workbook")
    }

    /// Creates a person source over the file using `config`'s layout.
    pub fn source(&self, config: &ImportConfig) -> SheetDataSource<PersonMapper> {
        SheetDataSource::with_config(self.workbook(), PersonMapper, config)
    }
}

/// Creates an empty person store that assigns sequential identifiers.
pub fn person_store() -> InMemoryRepository<Person> {
    InMemoryRepository::new().with_id_generator(SequentialIds::new())
}

/// Creates a person store holding `people` exactly as given.
///
/// Identifiers and audit metadata are kept, so a test can seed an entity
/// at an arbitrary version.
pub fn seeded_store(people: impl IntoIterator<Item = Person>) -> InMemoryRepository<Person> {
    InMemoryRepository::with_entities(people).with_id_generator(SequentialIds::new())
}

/// Looks up a person that must exist.
pub fn stored(store: &impl Repository<Person>, id: i64) -> Person {
    store
        .find(&id)
        .expect("Store lookup failed")
        .unwrap_or_else(|| panic!("person {id} not stored"))
}
