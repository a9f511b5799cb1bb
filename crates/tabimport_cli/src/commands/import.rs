//! Import command implementation.

use crate::record::{Record, RecordMapper};
use std::path::Path;
use tabimport_engine::{ImportConfig, ImportInstructions, ImportReport, Importer, SheetDataSource};
use tabimport_entity::{JsonFileRepository, SequentialIds};
use tabimport_sheet::{SheetOptions, Workbook};

/// Settings collected from the command line.
#[derive(Debug, Clone)]
pub struct ImportArgs {
    /// Instructions for sheets without instruction columns.
    pub instructions: ImportInstructions,
    /// Abort on the first store error.
    pub fail_fast: bool,
    /// List stored records the sheet never referenced.
    pub report_unmatched: bool,
    /// Field delimiter of the sheet.
    pub delimiter: u8,
}

impl Default for ImportArgs {
    fn default() -> Self {
        Self {
            instructions: ImportInstructions::new(),
            fail_fast: false,
            report_unmatched: false,
            delimiter: b',',
        }
    }
}

/// Runs the import command.
pub fn run(
    sheet: &Path,
    store: &Path,
    args: &ImportArgs,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = import(sheet, store, args)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_text_output(sheet, &report);
        }
    }

    if !report.is_clean() {
        return Err(format!("{} item(s) conflicted or failed", report.failures()).into());
    }
    Ok(())
}

/// Imports `sheet` into the JSON store at `store`.
pub fn import(sheet: &Path, store: &Path, args: &ImportArgs) -> Result<ImportReport, Box<dyn std::error::Error>> {
    let config = ImportConfig::new()
        .with_default_instructions(args.instructions)
        .with_fail_fast(args.fail_fast)
        .with_report_unmatched(args.report_unmatched);

    let repository = JsonFileRepository::<Record>::open(store)?.with_id_generator(SequentialIds::new());
    let options = SheetOptions::new().delimiter(args.delimiter);
    let workbook = Workbook::from_path_with(sheet, options)?;
    let mut source =
        SheetDataSource::with_config(workbook, RecordMapper::new(config.layout.clone()), &config);

    tracing::info!(sheet = %sheet.display(), store = %store.display(), defaults = %args.instructions, "starting import");
    let importer = Importer::new(repository, config);
    Ok(importer.run(&mut source)?)
}

fn print_text_output(sheet: &Path, report: &ImportReport) {
    println!("Import of {}", sheet.display());
    println!();
    for item in report.items() {
        let entity = item.entity_id.as_deref().unwrap_or("-");
        print!("  row {:>5}  id {:>6}  {}", item.item, entity, item.status);
        if let Some(message) = &item.message {
            print!(" ({message})");
        }
        if !item.synced_columns.is_empty() {
            print!(" [wrote {}]", item.synced_columns.join(", "));
        }
        println!();
    }
    println!();
    println!("Summary: {report}");
    if !report.unmatched().is_empty() {
        println!("Unmatched ids: {}", report.unmatched().join(", "));
    }
}
