//! # tabimport entity
//!
//! Entity model and destination store contract for tabimport.
//!
//! This crate provides:
//! - The [`Entity`] trait: identifier, payload and audit metadata
//! - Kind-aware identity through [`EntityKey`]
//! - Pluggable identifier generation ([`IdGenerator`])
//! - The [`Repository`] CRUD contract the import engine calls through
//! - Reference stores: [`InMemoryRepository`] and [`JsonFileRepository`]
//!
//! ## Key Invariants
//!
//! - Two entities share an identity only if their kinds match AND their
//!   identifiers are equal; an entity without an identifier has no identity
//! - Payload comparison never looks at audit metadata
//! - The store alone advances versions and timestamps

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod repository;

pub use entity::{
    AuditInfo, Entity, EntityKey, IdGenerator, SequentialIds, UuidIds,
};
pub use error::{StoreError, StoreResult};
pub use repository::{InMemoryRepository, JsonFileRepository, Repository};
