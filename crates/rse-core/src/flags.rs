//! Source claims stored in the `action_flags` column.
//!
//! Every bit of the mask is one independent feed claiming that a system
//! belongs in the catalog. A row is active while at least one source claims
//! it; the last claim being released soft-deletes the row.
//!
//! ```text
//! claims = {}            -> deleted_at = <run timestamp>
//! claims = {main_dump}   -> deleted_at = NULL
//! claims = {main_dump, nav_beacon} - main_dump -> {nav_beacon}, still active
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// A feed that can claim catalog rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Systems present in the main "systems without coordinates" dump.
    MainDump,
    /// Systems listed in the navigation beacon feed.
    NavBeacon,
}

impl Source {
    /// Every known source, in bit order.
    pub const ALL: [Self; 2] = [Self::MainDump, Self::NavBeacon];

    /// The bit this source owns in `action_flags`.
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::MainDump => 1,
            Self::NavBeacon => 1 << 1,
        }
    }

    /// Return the string representation used in SQL storage and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MainDump => "main_dump",
            Self::NavBeacon => "nav_beacon",
        }
    }

    /// Human readable explanation, seeded into the `sources` table.
    #[must_use]
    pub const fn explanation(self) -> &'static str {
        match self {
            Self::MainDump => "Listed in the systems-without-coordinates dump",
            Self::NavBeacon => "Has a navigation beacon that needs scanning",
        }
    }

    /// Look up the source owning a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSource`] if no source owns `bit`.
    pub fn from_bit(bit: u32) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|source| source.bit() == bit)
            .ok_or(CoreError::UnknownSource(bit))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SourceClaims
// ---------------------------------------------------------------------------

/// The set of sources currently claiming a catalog row.
///
/// Wraps the raw `action_flags` mask so that the zero-mask invariant is
/// evaluated in one place: [`SourceClaims::is_active`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceClaims(u32);

impl SourceClaims {
    /// No source claims the row.
    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    /// Claims exactly as stored. Unknown bits are preserved untouched so a
    /// newer writer's claims survive an older reader.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Add `source`'s claim.
    #[must_use]
    pub const fn with(self, source: Source) -> Self {
        Self(self.0 | source.bit())
    }

    /// Release `source`'s claim, leaving every other claim intact.
    #[must_use]
    pub const fn without(self, source: Source) -> Self {
        Self(self.0 & Self::release_mask(source))
    }

    #[must_use]
    pub const fn claims(self, source: Source) -> bool {
        self.0 & source.bit() == source.bit()
    }

    /// A row is active iff some source claims it.
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.0 != 0
    }

    /// Mask that clears `source`'s bit when AND-ed with `action_flags`.
    #[must_use]
    pub const fn release_mask(source: Source) -> u32 {
        !source.bit()
    }

    /// Known sources present in the mask.
    pub fn sources(self) -> impl Iterator<Item = Source> {
        Source::ALL.into_iter().filter(move |s| self.claims(*s))
    }
}

impl From<Source> for SourceClaims {
    fn from(source: Source) -> Self {
        Self::none().with(source)
    }
}
