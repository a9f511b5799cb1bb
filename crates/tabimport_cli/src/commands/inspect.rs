//! Inspect command implementation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tabimport_engine::ColumnLayout;
use tabimport_sheet::{SheetOptions, SheetResult, Workbook};

/// Sheet inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Sheet path.
    pub path: String,
    /// Header names in column order.
    pub columns: Vec<String>,
    /// Columns mapped onto the record payload.
    pub payload_columns: Vec<String>,
    /// Number of data rows, blank rows included.
    pub rows: usize,
    /// Rows with every cell blank.
    pub blank_rows: usize,
    /// Rows that already carry an identifier.
    pub identified_rows: usize,
    /// Rows setting each instruction column, by column name.
    pub instructions: BTreeMap<String, usize>,
    /// Flag cells holding neither token, as `(row, column)`.
    pub invalid_flags: Vec<(usize, String)>,
}

/// Runs the inspect command.
pub fn run(path: &Path, delimiter: u8, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, delimiter)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Reads `path` without modifying it and summarizes its rows.
pub fn inspect(path: &Path, delimiter: u8) -> SheetResult<InspectResult> {
    let options = SheetOptions::new().delimiter(delimiter).read_only(true);
    let mut workbook = Workbook::from_path_with(path, options)?;
    let layout = ColumnLayout::default();

    workbook.scoped(|sheet| {
        let columns = sheet.headers()?;
        let mut result = InspectResult {
            path: path.display().to_string(),
            payload_columns: columns
                .iter()
                .filter(|name| !name.is_empty() && !layout.is_reserved(name))
                .cloned()
                .collect(),
            columns,
            rows: sheet.row_count()?.saturating_sub(1),
            blank_rows: 0,
            identified_rows: 0,
            instructions: BTreeMap::new(),
            invalid_flags: Vec::new(),
        };

        let has_id = sheet.has_column(&layout.id)?;
        let mut flags = Vec::new();
        for column in layout.instruction_columns() {
            if sheet.has_column(column)? {
                result.instructions.insert(column.to_string(), 0);
                flags.push(column);
            }
        }

        for row in 1..=result.rows {
            if (0..result.columns.len()).all(|c| sheet.cell(row, c).is_ok_and(|cell| cell.is_blank())) {
                result.blank_rows += 1;
                continue;
            }
            if has_id && !sheet.cell(row, layout.id.as_str())?.is_blank() {
                result.identified_rows += 1;
            }
            for &column in &flags {
                match sheet.read_yes_no(row, column) {
                    Ok(Some(true)) => {
                        *result.instructions.entry(column.to_string()).or_default() += 1;
                    }
                    Ok(_) => {}
                    Err(e) if e.is_format() => result.invalid_flags.push((row, column.to_string())),
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(result)
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Sheet Inspection");
    println!("================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Columns:");
    println!("  All:     {}", result.columns.join(", "));
    println!("  Payload: {}", result.payload_columns.join(", "));
    println!();
    println!("Rows:");
    println!("  Data rows:       {}", result.rows);
    println!("  Blank rows:      {}", result.blank_rows);
    println!("  With identifier: {}", result.identified_rows);

    if !result.instructions.is_empty() {
        println!();
        println!("Instructions:");
        for (column, count) in &result.instructions {
            println!("  {column:<7} {count}");
        }
    }

    if !result.invalid_flags.is_empty() {
        println!();
        println!("Invalid flags:");
        for (row, column) in &result.invalid_flags {
            println!("  row {row}, column {column}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn summarizes_rows_and_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.csv");
        let content = "ID,NAME,INSERT,SYNC\n1,Ann,Y,N\n,,,\n,Bob,y,maybe\n";
        std::fs::write(&path, content).unwrap();

        let result = inspect(&path, b',').unwrap();

        assert_eq!(result.columns, vec!["ID", "NAME", "INSERT", "SYNC"]);
        assert_eq!(result.payload_columns, vec!["NAME"]);
        assert_eq!(result.rows, 3);
        assert_eq!(result.blank_rows, 1);
        assert_eq!(result.identified_rows, 1);
        assert_eq!(result.instructions.get("INSERT"), Some(&2));
        assert_eq!(result.instructions.get("SYNC"), Some(&0));
        assert_eq!(result.invalid_flags, vec![(3, "SYNC".to_string())]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }
}
