//! CLI response types returned by `rse` commands.

use serde::{Deserialize, Serialize};

use crate::flags::Source;

/// How a sync run treated the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Catalog discarded and recreated from the working set.
    FullBuild,
    /// Catalog reconciled against the working set.
    Incremental,
}

/// Response from `rse sync` and `rse beacons`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: Option<RunMode>,
    pub source: Option<Source>,
    /// Dump records read.
    pub read: usize,
    pub excluded_by_pattern: usize,
    pub excluded_by_name: usize,
    pub admitted: usize,
    pub ambiguous: usize,
    /// Working-set entries already active in the catalog, left untouched.
    pub unchanged: usize,
    pub resolved: usize,
    /// Entries the resolver could not place (including timeouts).
    pub unresolved: usize,
    pub inserted_or_updated: u64,
    pub retired: u64,
    /// Retired rows that lost their last claim and were soft-deleted.
    pub soft_deleted: u64,
    pub batches_committed: u64,
}

/// Per-source active counts reported by `rse status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: Source,
    pub active: u64,
}

/// Response from `rse status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub total: u64,
    pub active: u64,
    pub deleted: u64,
    pub by_source: Vec<SourceCount>,
    pub ambiguous_pending: u64,
}

/// Response from `rse verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Rows with no claim but no `deleted_at`.
    pub unclaimed_but_active: u64,
    /// Rows with a claim but a `deleted_at`.
    pub claimed_but_deleted: u64,
}

impl VerifyReport {
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.unclaimed_but_active == 0 && self.claimed_but_deleted == 0
    }
}
