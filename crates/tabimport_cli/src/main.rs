//! tabimport CLI
//!
//! Command-line front end for importing CSV sheets into a JSON entity store.
//!
//! # Commands
//!
//! - `import` - Reconcile a sheet against a store, optionally writing back
//! - `inspect` - Summarize a sheet's columns, rows and instruction flags

mod commands;
mod record;

use clap::{Parser, Subcommand};
use commands::import::ImportArgs;
use std::path::PathBuf;
use tabimport_engine::ImportInstructions;
use tracing_subscriber::EnvFilter;

/// Import spreadsheet rows into an entity store.
#[derive(Parser)]
#[command(name = "tabimport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the CSV sheet
    #[arg(global = true, short, long)]
    sheet: Option<PathBuf>,

    /// Field delimiter of the sheet
    #[arg(global = true, short, long, default_value_t = ',')]
    delimiter: char,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the sheet against a JSON store
    Import {
        /// Path to the JSON store file (created if missing)
        #[arg(long)]
        store: PathBuf,

        /// Insert rows with no stored counterpart
        #[arg(long)]
        insert: bool,

        /// Replace stored records that differ
        #[arg(long)]
        update: bool,

        /// Patch stored records with the row's present cells
        #[arg(long)]
        merge: bool,

        /// Delete stored records that differ
        #[arg(long)]
        remove: bool,

        /// Update even when the row's version is stale
        #[arg(long)]
        force: bool,

        /// Write identifiers and canonical values back into the sheet
        #[arg(long)]
        sync: bool,

        /// Abort on the first store error
        #[arg(long)]
        fail_fast: bool,

        /// List stored records no row referenced
        #[arg(long)]
        report_unmatched: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Summarize a sheet without modifying it
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let delimiter = u8::try_from(cli.delimiter).map_err(|_| "Delimiter must be a single-byte character")?;

    match cli.command {
        Commands::Import {
            store,
            insert,
            update,
            merge,
            remove,
            force,
            sync,
            fail_fast,
            report_unmatched,
            format,
        } => {
            let sheet = cli.sheet.ok_or("Sheet path required for import")?;
            let args = ImportArgs {
                instructions: ImportInstructions::new()
                    .with_insert(insert)
                    .with_update(update)
                    .with_merge(merge)
                    .with_remove(remove)
                    .with_force(force)
                    .with_sync(sync),
                fail_fast,
                report_unmatched,
                delimiter,
            };
            commands::import::run(&sheet, &store, &args, &format)?;
        }
        Commands::Inspect { format } => {
            let sheet = cli.sheet.ok_or("Sheet path required for inspect")?;
            commands::inspect::run(&sheet, delimiter, &format)?;
        }
        Commands::Version => {
            println!("tabimport CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
