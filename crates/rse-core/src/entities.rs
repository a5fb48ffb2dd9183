//! Entity structs for the catalog, the raw dump, and a run's working set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::flags::SourceClaims;

/// Position estimate shipped with a dump record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Radius of the estimate's error, in light years.
    #[serde(default)]
    pub precision: f64,
}

/// One raw entry of the systems-without-coordinates dump.
///
/// Only the stable 64-bit identity is read; the dump's own site-local `id`
/// column is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpRecord {
    pub name: String,
    #[serde(rename = "id64", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(
        rename = "estimatedCoordinates",
        alias = "estimatedPosition",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated: Option<EstimatedPosition>,
}

/// A dump record admitted by the filter for this run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingSetEntry {
    pub name: String,
    /// Identity known before resolution, from the dump or the known-id table.
    pub id: Option<u64>,
    pub estimated: Option<EstimatedPosition>,
}

impl WorkingSetEntry {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            estimated: None,
        }
    }

    #[must_use]
    pub const fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

impl From<DumpRecord> for WorkingSetEntry {
    fn from(record: DumpRecord) -> Self {
        Self {
            name: record.name,
            id: record.id,
            estimated: record.estimated,
        }
    }
}

/// A system the resolver could place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSystem {
    pub id: u64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Radius of the position error; 0 means exact.
    pub uncertainty: u32,
}

impl ResolvedSystem {
    /// Reject records that must never reach the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] for an empty name or a
    /// non-finite coordinate.
    pub fn validate(self) -> Result<Self, CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidRecord {
                name: self.name,
                reason: "empty name".into(),
            });
        }
        if ![self.x, self.y, self.z].iter().all(|c| c.is_finite()) {
            return Err(CoreError::InvalidRecord {
                reason: format!("non-finite position ({}, {}, {})", self.x, self.y, self.z),
                name: self.name,
            });
        }
        Ok(self)
    }

    /// Build a record from the dump's own estimate, when the entry carries
    /// both an identity and an estimated position.
    #[must_use]
    pub fn from_estimate(entry: &WorkingSetEntry) -> Option<Self> {
        let id = entry.id?;
        let estimate = entry.estimated?;
        Some(Self {
            id,
            name: entry.name.clone(),
            x: estimate.x,
            y: estimate.y,
            z: estimate.z,
            uncertainty: precision_to_uncertainty(estimate.precision),
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn precision_to_uncertainty(precision: f64) -> u32 {
    if precision.is_finite() && precision > 0.0 {
        precision.ceil().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// A persisted catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub uncertainty: u32,
    pub claims: SourceClaims,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CatalogEntry {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Soft-deleted exactly when no source claims the row.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.is_deleted() != self.claims.is_active()
    }
}

/// A non-procedural name carrying several known identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousEntry {
    pub name: String,
    pub candidate_ids: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Source;
    use pretty_assertions::assert_eq;

    fn sol() -> ResolvedSystem {
        ResolvedSystem {
            id: 10,
            name: "Sol".into(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            uncertainty: 0,
        }
    }

    #[test]
    fn dump_record_reads_edsm_shape() {
        let json = r#"{"id":123,"id64":10477373803,"name":"Sol",
            "estimatedCoordinates":{"x":1.5,"y":-2.0,"z":3.25,"precision":12}}"#;
        let record: DumpRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Sol");
        assert_eq!(record.id, Some(10_477_373_803));
        let est = record.estimated.unwrap();
        assert_eq!((est.x, est.y, est.z, est.precision), (1.5, -2.0, 3.25, 12.0));
    }

    #[test]
    fn dump_record_accepts_estimated_position_alias() {
        let json = r#"{"name":"Test","estimatedPosition":{"x":1,"y":2,"z":3}}"#;
        let record: DumpRecord = serde_json::from_str(json).unwrap();
        assert!(record.id.is_none());
        assert_eq!(record.estimated.unwrap().precision, 0.0);
    }

    #[test]
    fn dump_record_without_identity_or_estimate() {
        let record: DumpRecord = serde_json::from_str(r#"{"name":"Lonely"}"#).unwrap();
        let entry = WorkingSetEntry::from(record);
        assert_eq!(entry, WorkingSetEntry::named("Lonely"));
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut bad = sol();
        bad.name = "  ".into();
        assert!(matches!(bad.validate(), Err(CoreError::InvalidRecord { .. })));
    }

    #[test]
    fn validate_rejects_nan_position() {
        let mut bad = sol();
        bad.y = f64::NAN;
        assert!(bad.validate().is_err());
        assert_eq!(sol().validate().unwrap(), sol());
    }

    #[test]
    fn estimate_requires_id_and_position() {
        let mut entry = WorkingSetEntry::named("Est").with_id(7);
        assert!(ResolvedSystem::from_estimate(&entry).is_none());

        entry.estimated = Some(EstimatedPosition {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            precision: 9.2,
        });
        let resolved = ResolvedSystem::from_estimate(&entry).unwrap();
        assert_eq!(resolved.id, 7);
        assert_eq!(resolved.uncertainty, 10);

        entry.id = None;
        assert!(ResolvedSystem::from_estimate(&entry).is_none());
    }

    #[test]
    fn entry_consistency_follows_claims() {
        let now = Utc::now();
        let mut entry = CatalogEntry {
            id: 10,
            name: "Sol".into(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            uncertainty: 0,
            claims: SourceClaims::from(Source::MainDump),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        assert!(entry.is_consistent());

        entry.claims = SourceClaims::none();
        assert!(!entry.is_consistent());

        entry.deleted_at = Some(now);
        assert!(entry.is_consistent());
    }
}
