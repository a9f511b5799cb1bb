//! # tabimport engine
//!
//! Reconciles the rows of a tabular document against an entity store.
//!
//! This crate provides:
//! - [`ImportInstructions`]: the per-record policy flags
//! - [`ImportItem`] and the [`ImportStatus`] / [`ImportResult`] outcome taxonomy
//! - The [`DataSource`] cursor contract and its sheet implementation
//!   ([`SheetDataSource`] driven by an integrator's [`RowMapper`])
//! - The [`Reconciler`] decision procedure, with write-back of canonical values
//! - The [`Importer`] driver producing an [`ImportReport`]
//!
//! ## Architecture
//!
//! ```text
//! Workbook ──► SheetDataSource ──► ImportItem ──► Reconciler ──► Repository
//!    ▲                                                │
//!    └────────────── sync (write-back) ◄──────────────┘
//! ```
//!
//! ## Key Invariants
//!
//! - Items are processed one at a time, in row order
//! - An item's result is replaced once per pass and starts `PENDING`
//! - Item identity is the item identifier alone
//! - The store alone advances versions and timestamps
//! - A store failure fails its item; document failures abort the run

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod importer;
mod instructions;
mod item;
mod reconcile;
mod result;
mod sheet_source;
mod source;

#[cfg(test)]
mod test_entity;

pub use config::{ColumnLayout, ImportConfig};
pub use error::{EngineError, EngineResult};
pub use importer::{ImportReport, Importer, ItemReport};
pub use instructions::ImportInstructions;
pub use item::{ImportItem, ImportItemBuilder};
pub use reconcile::{Reconciler, Reconciliation};
pub use result::{ImportResult, ImportStatus};
pub use sheet_source::{CellId, RowChanges, RowMapper, SheetDataSource};
pub use source::{DataSource, Items, SyncReport};
