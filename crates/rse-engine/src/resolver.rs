//! Name resolution boundary.
//!
//! [`Resolver`] turns a system name into an identity and position;
//! [`IdentityLookup`] answers the two questions the filter asks about a name.
//! Both are called from blocking worker threads, so implementations must be
//! `Send + Sync` and free of interior locking on the hot path.
//!
//! [`TableResolver`] is the concrete implementation: a table of known systems
//! loaded from JSON lines, one `{name, id64, x, y, z, uncertainty}` object
//! per line.

use std::collections::HashMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use rse_core::ResolvedSystem;
use serde::Deserialize;

use crate::error::{EngineError, ResolveError};

/// Resolves a system name to its identity and position.
pub trait Resolver: Send + Sync {
    /// `Ok(None)` means the name is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the name cannot be resolved to a single
    /// system.
    fn resolve(&self, name: &str) -> Result<Option<ResolvedSystem>, ResolveError>;
}

/// Identity questions asked while filtering.
pub trait IdentityLookup: Send + Sync {
    /// Whether `name` follows the procedural sector naming scheme, which
    /// encodes the identity in the name itself.
    fn is_procedural(&self, name: &str) -> bool;

    /// Every known identity carrying `name`, compared case-insensitively.
    fn known_ids(&self, name: &str) -> Vec<u64>;
}

/// Recognises procedurally generated names such as `Wregoe AB-C d1-2`.
#[derive(Debug, Clone)]
pub struct ProceduralNames {
    pattern: Regex,
}

impl ProceduralNames {
    /// # Errors
    ///
    /// Returns [`EngineError::Pattern`] if the pattern fails to compile.
    pub fn new() -> Result<Self, EngineError> {
        let pattern = RegexBuilder::new(r"^.+ [a-z]{2}-[a-z] [a-h](?:\d+-)?\d+$")
            .case_insensitive(true)
            .build()?;
        Ok(Self { pattern })
    }

    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.pattern.is_match(name.trim())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct KnownSystem {
    name: String,
    id64: u64,
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    uncertainty: u32,
}

impl From<&KnownSystem> for ResolvedSystem {
    fn from(known: &KnownSystem) -> Self {
        Self {
            id: known.id64,
            name: known.name.clone(),
            x: known.x,
            y: known.y,
            z: known.z,
            uncertainty: known.uncertainty,
        }
    }
}

/// In-memory table of known systems keyed by lowercased name.
#[derive(Debug, Clone)]
pub struct TableResolver {
    by_name: HashMap<String, Vec<KnownSystem>>,
    procedural: ProceduralNames,
}

impl TableResolver {
    /// Load the table from a JSON-lines file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the file cannot be opened or any line fails
    /// to parse.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let rows = serde_jsonlines::json_lines::<KnownSystem, _>(path)
            .map_err(|e| EngineError::io(path, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::Table {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let resolver = Self::from_known(rows)?;
        tracing::info!(
            path = %path.display(),
            names = resolver.by_name.len(),
            "known-systems table loaded"
        );
        Ok(resolver)
    }

    fn from_known(rows: Vec<KnownSystem>) -> Result<Self, EngineError> {
        let mut by_name: HashMap<String, Vec<KnownSystem>> = HashMap::new();
        for row in rows {
            let entry = by_name.entry(row.name.to_lowercase()).or_default();
            if !entry.iter().any(|known| known.id64 == row.id64) {
                entry.push(row);
            }
        }
        Ok(Self {
            by_name,
            procedural: ProceduralNames::new()?,
        })
    }

    /// Number of distinct names in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn lookup(&self, name: &str) -> &[KnownSystem] {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Resolver for TableResolver {
    fn resolve(&self, name: &str) -> Result<Option<ResolvedSystem>, ResolveError> {
        match self.lookup(name) {
            [] => Ok(None),
            [known] => Ok(Some(ResolvedSystem::from(known))),
            several => Err(ResolveError::Ambiguous {
                name: name.to_string(),
                count: several.len(),
            }),
        }
    }
}

impl IdentityLookup for TableResolver {
    fn is_procedural(&self, name: &str) -> bool {
        self.procedural.is_match(name)
    }

    fn known_ids(&self, name: &str) -> Vec<u64> {
        self.lookup(name).iter().map(|known| known.id64).collect()
    }
}
