//! Errors raised by the core types themselves.
//!
//! Storage, transport and engine failures live in their own crates
//! (`DatabaseError`, `DumpError`, `EngineError`) and meet in `rse-cli`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A resolved record has non-finite coordinates or an empty name.
    #[error("Invalid resolved system '{name}': {reason}")]
    InvalidRecord { name: String, reason: String },

    /// A stored flag value names a bit no [`crate::Source`] owns.
    #[error("Unknown source bit: {0:#x}")]
    UnknownSource(u32),
}
