//! Entity and row mapper used by the unit tests.

use crate::sheet_source::{CellId, RowChanges, RowMapper};
use tabimport_entity::{AuditInfo, Entity};
use tabimport_sheet::{SheetResult, Workbook};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Pet {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub audit: AuditInfo,
}

impl Pet {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_id(id: i64, name: &str) -> Self {
        Self {
            id: Some(id),
            ..Self::named(name)
        }
    }
}

impl Entity for Pet {
    type Id = i64;
    const KIND: &'static str = "pet";

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
        self.name == other.name && self.age == other.age
    }

    fn merge_from(&mut self, source: &Self) -> Vec<String> {
        let mut fields = Vec::new();
        if source.name.is_some() && source.name != self.name {
            self.name = source.name.clone();
            fields.push("name".to_string());
        }
        if source.age.is_some() && source.age != self.age {
            self.age = source.age;
            fields.push("age".to_string());
        }
        fields
    }

    fn replace_from(&mut self, source: &Self) {
        self.name = source.name.clone();
        self.age = source.age;
    }
}

/// Maps `NAME` and, when the sheet has it, `AGE`.
pub(crate) struct PetMapper;

impl RowMapper for PetMapper {
    type Entity = Pet;

    fn create_entity_instance(&self) -> Pet {
        Pet::default()
    }

    fn read_entity_id(&self, sheet: &Workbook, row: usize, column: &str) -> SheetResult<Option<i64>> {
        i64::read_cell(sheet, row, column)
    }

    fn write_entity_id(&self, sheet: &mut Workbook, row: usize, column: &str, id: &i64) -> SheetResult<bool> {
        id.write_cell(sheet, row, column)
    }

    fn read_item_data(&self, sheet: &Workbook, row: usize, pet: &mut Pet) -> SheetResult<()> {
        pet.name = sheet.read_string(row, "NAME")?;
        if sheet.has_column("AGE")? {
            pet.age = sheet.read_i64(row, "AGE")?;
        }
        Ok(())
    }

    fn write_item_data(
        &self,
        sheet: &mut Workbook,
        row: usize,
        pet: &Pet,
        changes: &mut RowChanges,
    ) -> SheetResult<()> {
        changes.track("NAME", sheet.write_string(row, "NAME", pet.name.as_deref())?);
        if sheet.has_column("AGE")? {
            changes.track("AGE", sheet.write_i64(row, "AGE", pet.age)?);
        }
        Ok(())
    }
}
