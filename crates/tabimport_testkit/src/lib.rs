//! # tabimport testkit
//!
//! Test utilities for tabimport.
//!
//! This crate provides:
//! - A sample [`Person`] entity and its [`PersonMapper`]
//! - Temporary CSV sheets and pre-seeded in-memory stores
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tabimport_testkit::prelude::*;
//!
//! #[test]
//! fn inserts_new_rows() {
//!     let sheet = TempSheet::with_rows("ID,NAME,INSERT", &[",Alice,Y"]);
//!     let importer = Importer::new(person_store(), ImportConfig::default());
//!     let report = importer.run(&mut sheet.source(importer.config())).unwrap();
//!     assert_eq!(report.count(ImportStatus::Inserted), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use tabimport_engine::{ImportConfig, ImportInstructions, ImportStatus, Importer};
}

pub use fixtures::*;
pub use generators::*;
