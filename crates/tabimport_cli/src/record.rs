//! Schema-less entity for sheets the CLI knows nothing about.
//!
//! Every column outside the engine's reserved layout becomes a text field
//! keyed by its header name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabimport_engine::{CellId, ColumnLayout, RowChanges, RowMapper};
use tabimport_entity::{AuditInfo, Entity};
use tabimport_sheet::{SheetResult, Workbook};

/// A row stored as a map of column name to text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the store.
    pub id: Option<i64>,
    /// Non-blank payload cells by column name.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Store-managed metadata.
    #[serde(default)]
    pub audit: AuditInfo,
}

impl Entity for Record {
    type Id = i64;
    const KIND: &'static str = "record";

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
        self.fields == other.fields
    }

    fn merge_from(&mut self, source: &Self) -> Vec<String> {
        let mut changed = Vec::new();
        for (name, value) in &source.fields {
            if self.fields.get(name) != Some(value) {
                self.fields.insert(name.clone(), value.clone());
                changed.push(name.clone());
            }
        }
        changed
    }

    fn replace_from(&mut self, source: &Self) {
        self.fields.clone_from(&source.fields);
    }
}

/// Maps every non-reserved column of the sheet onto [`Record::fields`].
#[derive(Debug, Clone, Default)]
pub struct RecordMapper {
    layout: ColumnLayout,
}

impl RecordMapper {
    /// Creates a mapper that leaves `layout`'s columns to the engine.
    pub fn new(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    fn payload_columns(&self, sheet: &Workbook) -> SheetResult<Vec<String>> {
        Ok(sheet
            .headers()?
            .into_iter()
            .filter(|name| !name.is_empty() && !self.layout.is_reserved(name))
            .collect())
    }
}

impl RowMapper for RecordMapper {
    type Entity = Record;

    fn create_entity_instance(&self) -> Record {
        Record::default()
    }

    fn read_entity_id(&self, sheet: &Workbook, row: usize, column: &str) -> SheetResult<Option<i64>> {
        i64::read_cell(sheet, row, column)
    }

    fn write_entity_id(&self, sheet: &mut Workbook, row: usize, column: &str, id: &i64) -> SheetResult<bool> {
        id.write_cell(sheet, row, column)
    }

    fn read_item_data(&self, sheet: &Workbook, row: usize, record: &mut Record) -> SheetResult<()> {
        for column in self.payload_columns(sheet)? {
            if let Some(value) = sheet.read_string(row, column.as_str())? {
                record.fields.insert(column, value);
            }
        }
        Ok(())
    }

    fn write_item_data(
        &self,
        sheet: &mut Workbook,
        row: usize,
        record: &Record,
        changes: &mut RowChanges,
    ) -> SheetResult<()> {
        for column in self.payload_columns(sheet)? {
            let value = record.fields.get(&column).map(String::as_str);
            changes.track(&column, sheet.write_string(row, column.as_str(), value)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record(pairs: &[(&str, &str)]) -> Record {
        Record {
            fields: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ..Record::default()
        }
    }

    #[test]
    fn merge_adds_and_overwrites_present_fields() {
        let mut stored = record(&[("CITY", "Lyon"), ("NAME", "Ann")]);
        let fields = stored.merge_from(&record(&[("NAME", "Anne"), ("ZIP", "69001")]));

        assert_eq!(fields, vec!["NAME".to_string(), "ZIP".to_string()]);
        assert_eq!(stored.fields.get("CITY").map(String::as_str), Some("Lyon"));
        assert_eq!(stored.fields.get("NAME").map(String::as_str), Some("Anne"));
    }

    #[test]
    fn mapper_skips_reserved_and_blank_columns() {
        let csv = "ID,NAME,CITY,VERSION,INSERT\n4,Ann,,2,Y\n";
        let mut sheet = Workbook::from_reader(Cursor::new(csv.as_bytes().to_vec()));
        sheet.open().unwrap();

        let mapper = RecordMapper::default();
        let mut record = Record::default();
        mapper.read_item_data(&sheet, 1, &mut record).unwrap();

        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.fields.get("NAME").map(String::as_str), Some("Ann"));
        assert_eq!(mapper.read_entity_id(&sheet, 1, "ID").unwrap(), Some(4));
    }
}
