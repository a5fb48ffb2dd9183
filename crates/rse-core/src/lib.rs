//! # rse-core
//!
//! Core types, source flags, and error types for the RSE catalog.
//!
//! This crate provides the foundational types shared across all RSE crates:
//! - Entity structs for catalog rows, dump records, and working-set entries
//! - The source-claim flag model that drives soft deletion
//! - Run report counters returned by the CLI
//! - Cross-cutting error types

pub mod entities;
pub mod errors;
pub mod flags;
pub mod responses;

pub use entities::{
    AmbiguousEntry, CatalogEntry, DumpRecord, EstimatedPosition, ResolvedSystem, WorkingSetEntry,
};
pub use errors::CoreError;
pub use flags::{Source, SourceClaims};
pub use responses::{RunMode, RunReport, SourceCount, StatusReport, VerifyReport};
