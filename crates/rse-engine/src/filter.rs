//! Filter engine: decides which dump records enter the working set.
//!
//! Each record is classified exactly once, in this order: excluded by prefix,
//! excluded by explicit name, ambiguous (a non-procedural name carrying
//! several known identities), admitted. The engine never touches the
//! catalog.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use rse_core::{AmbiguousEntry, DumpRecord, WorkingSetEntry};

use crate::error::EngineError;
use crate::resolver::IdentityLookup;

/// Shortest entry kept when reading an exclusion list.
///
/// Length is counted after trimming whitespace and the line terminator, so a
/// line holding `ab` is dropped even though the raw line is three characters
/// long with its newline.
const MIN_ENTRY_CHARS: usize = 3;

// ---------------------------------------------------------------------------
// Exclusion lists
// ---------------------------------------------------------------------------

/// A newline-delimited list of prefixes or names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    entries: Vec<String>,
}

impl ExclusionList {
    /// Parse list text: entries are trimmed, blank lines and entries of two
    /// characters or fewer are dropped.
    #[must_use]
    pub fn from_lines(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| line.chars().count() >= MIN_ENTRY_CHARS)
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    /// Read a list file. A missing file is an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] for any read failure other than the file
    /// not existing.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let list = Self::from_lines(&text);
                tracing::debug!(path = %path.display(), entries = list.len(), "exclusion list loaded");
                Ok(list)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "exclusion list not found, treating as empty");
                Ok(Self::default())
            }
            Err(e) => Err(EngineError::io(path, e)),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Matchers
// ---------------------------------------------------------------------------

/// Case-insensitive prefix matcher compiled once from the prefix list.
///
/// Prefixes are matched literally. An empty list never matches anything.
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    pattern: Option<Regex>,
}

impl ExclusionMatcher {
    /// # Errors
    ///
    /// Returns [`EngineError::Pattern`] if the combined pattern exceeds the
    /// regex size limit.
    pub fn new<S: AsRef<str>>(prefixes: &[S]) -> Result<Self, EngineError> {
        let alternation: Vec<String> = prefixes
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();
        if alternation.is_empty() {
            return Ok(Self { pattern: None });
        }
        let pattern = RegexBuilder::new(&format!("^(?:{})", alternation.join("|")))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(name))
    }
}

/// Case-insensitive exact-name set.
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    names: HashSet<String>,
}

impl NameSet {
    #[must_use]
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            names: names
                .iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_lowercase())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Where one dump record ends up.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Admitted(WorkingSetEntry),
    ExcludedByPattern,
    ExcludedByName,
    Ambiguous(AmbiguousEntry),
}

/// Result of filtering a whole dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub admitted: Vec<WorkingSetEntry>,
    pub ambiguous: Vec<AmbiguousEntry>,
    pub excluded_by_pattern: usize,
    pub excluded_by_name: usize,
}

/// Prefix matcher, name set and identity lookup bundled for classification.
#[derive(Clone)]
pub struct FilterEngine {
    prefixes: ExclusionMatcher,
    names: NameSet,
    lookup: Arc<dyn IdentityLookup>,
}

impl FilterEngine {
    /// # Errors
    ///
    /// Returns [`EngineError::Pattern`] if the prefixes fail to compile.
    pub fn new(
        prefixes: &ExclusionList,
        names: &ExclusionList,
        lookup: Arc<dyn IdentityLookup>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            prefixes: ExclusionMatcher::new(prefixes.entries())?,
            names: NameSet::new(names.entries()),
            lookup,
        })
    }

    /// Identity lookup shared with the beacon pass.
    #[must_use]
    pub fn lookup(&self) -> &Arc<dyn IdentityLookup> {
        &self.lookup
    }

    /// Classify one record.
    ///
    /// A non-procedural name with exactly one known identity and no identity
    /// of its own in the dump takes the known one.
    #[must_use]
    pub fn classify(&self, record: DumpRecord) -> Admission {
        if self.prefixes.is_match(&record.name) {
            return Admission::ExcludedByPattern;
        }
        if self.names.contains(&record.name) {
            return Admission::ExcludedByName;
        }

        let mut entry = WorkingSetEntry::from(record);
        if self.lookup.is_procedural(&entry.name) {
            return Admission::Admitted(entry);
        }
        let known = self.lookup.known_ids(&entry.name);
        if known.len() > 1 {
            return Admission::Ambiguous(AmbiguousEntry {
                name: entry.name,
                candidate_ids: known,
            });
        }
        if let Some(&id) = known.first() {
            entry.id.get_or_insert(id);
        }
        Admission::Admitted(entry)
    }

    /// Split a dump into admitted and ambiguous entries.
    #[must_use]
    pub fn admit(&self, records: Vec<DumpRecord>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for record in records {
            match self.classify(record) {
                Admission::Admitted(entry) => outcome.admitted.push(entry),
                Admission::ExcludedByPattern => outcome.excluded_by_pattern += 1,
                Admission::ExcludedByName => outcome.excluded_by_name += 1,
                Admission::Ambiguous(entry) => {
                    tracing::warn!(
                        name = %entry.name,
                        candidates = ?entry.candidate_ids,
                        "ambiguous system name, excluded for manual review"
                    );
                    outcome.ambiguous.push(entry);
                }
            }
        }
        tracing::info!(
            admitted = outcome.admitted.len(),
            ambiguous = outcome.ambiguous.len(),
            excluded_by_pattern = outcome.excluded_by_pattern,
            excluded_by_name = outcome.excluded_by_name,
            "dump filtered"
        );
        outcome
    }
}
