//! Delta reconciliation between the working set and the catalog.
//!
//! Planning is pure: [`plan`] splits the working set into entries that
//! survive untouched and entries that need resolution, and leaves the rest of
//! the active set as retirement candidates. [`apply`] then drives the
//! resolution pipeline and the batch writer with that plan.

use std::collections::{HashMap, HashSet};

use rse_core::WorkingSetEntry;
use rse_db::ActiveRow;

use crate::error::EngineError;
use crate::pipeline::ResolvedStream;
use crate::writer::BatchSender;

/// Rows one source currently claims, indexed by id and by lowercased name.
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    ids: HashSet<u64>,
    names: HashMap<String, u64>,
}

impl ActiveSet {
    #[must_use]
    pub fn from_rows(rows: Vec<ActiveRow>) -> Self {
        let mut set = Self::default();
        for row in rows {
            set.ids.insert(row.id);
            set.names.insert(row.name.to_lowercase(), row.id);
        }
        set
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The active row this entry already corresponds to, if any: by its
    /// known id, or by name when it carries no id.
    fn matching_id(&self, entry: &WorkingSetEntry) -> Option<u64> {
        match entry.id {
            Some(id) => self.ids.contains(&id).then_some(id),
            None => self.names.get(&entry.name.to_lowercase()).copied(),
        }
    }
}

/// What a reconciliation run has to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaPlan {
    /// Entries to resolve and upsert (new, reactivated or unmatched).
    pub to_resolve: Vec<WorkingSetEntry>,
    /// Active ids no entry claimed. Ids that come back from resolution are
    /// removed before retiring.
    pub retire_candidates: HashSet<u64>,
    /// Entries matching an active row; no write, no resolution.
    pub unchanged: usize,
}

/// Partition the working set against the active set.
#[must_use]
pub fn plan(working_set: Vec<WorkingSetEntry>, active: &ActiveSet) -> DeltaPlan {
    let mut retire_candidates = active.ids.clone();
    let mut to_resolve = Vec::new();
    let mut unchanged = 0;

    for entry in working_set {
        if let Some(id) = active.matching_id(&entry) {
            retire_candidates.remove(&id);
            unchanged += 1;
        } else {
            to_resolve.push(entry);
        }
    }

    tracing::info!(
        active = active.len(),
        unchanged,
        to_resolve = to_resolve.len(),
        retire_candidates = retire_candidates.len(),
        "reconciliation planned"
    );
    DeltaPlan {
        to_resolve,
        retire_candidates,
        unchanged,
    }
}

/// Counts from applying a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub resolved: usize,
    pub retired_requested: usize,
}

/// Feed resolved systems to the writer, then retire what is left.
///
/// # Errors
///
/// Returns [`EngineError::WriterClosed`] if the writer stops early.
pub async fn apply(
    mut resolved: ResolvedStream,
    mut retire_candidates: HashSet<u64>,
    sender: &mut BatchSender,
) -> Result<ApplyOutcome, EngineError> {
    let mut outcome = ApplyOutcome::default();
    while let Some(system) = resolved.next().await {
        retire_candidates.remove(&system.id);
        sender.push(system).await?;
        outcome.resolved += 1;
    }

    let mut retire: Vec<u64> = retire_candidates.into_iter().collect();
    retire.sort_unstable();
    outcome.retired_requested = retire.len();
    sender.retire(&retire).await?;
    Ok(outcome)
}
