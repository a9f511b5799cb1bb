//! # tabimport sheet
//!
//! Single-sheet tabular documents for tabimport.
//!
//! This crate provides:
//! - [`Workbook`]: an explicitly opened and closed delimited-text document
//! - Header-name column lookup through [`ColumnRef`]
//! - Typed cell reads and change-reporting typed cell writes
//! - Yes/no flag cells with configurable tokens ([`SheetOptions`])
//!
//! ## Key Invariants
//!
//! - Every cell operation requires an open document
//! - A blank cell reads as `None` for every type
//! - A write reports `true` only if the stored value actually changed
//! - Changes reach the file on `close` (or `flush`), never on a read-only document

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cell;
mod config;
mod error;
mod typed;
mod workbook;

pub use cell::CellValue;
pub use config::SheetOptions;
pub use error::{SheetError, SheetResult};
pub use workbook::{ColumnRef, Workbook};
