//! Resolver table and navigation beacon feed configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// JSON-lines table of known systems (`name`, `id64`, `x`, `y`, `z`, `uncertainty`).
    #[serde(default)]
    pub known_systems_path: String,
}

impl ResolverConfig {
    pub fn is_configured(&self) -> bool {
        !self.known_systems_path.trim().is_empty()
    }
}

const fn default_header_rows() -> usize {
    3
}

const fn default_name_column() -> usize {
    1
}

const fn default_beacon_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BeaconConfig {
    /// Published CSV export of the beacon sheet.
    #[serde(default)]
    pub url: String,

    /// Leading rows that carry titles rather than systems.
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,

    /// Zero-based column holding the system name.
    #[serde(default = "default_name_column")]
    pub name_column: usize,

    #[serde(default = "default_beacon_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            header_rows: default_header_rows(),
            name_column: default_name_column(),
            timeout_secs: default_beacon_timeout_secs(),
        }
    }
}

impl BeaconConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}
