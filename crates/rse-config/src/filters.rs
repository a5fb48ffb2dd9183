//! Exclusion list locations.

use serde::{Deserialize, Serialize};

fn default_permit_sectors_path() -> String {
    "permit_sectors.txt".to_string()
}

fn default_system_filter_path() -> String {
    "system_filter.txt".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Newline-delimited name prefixes (permit-locked sectors).
    #[serde(default = "default_permit_sectors_path")]
    pub permit_sectors_path: String,

    /// Newline-delimited exact names that are always excluded.
    #[serde(default = "default_system_filter_path")]
    pub system_filter_path: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            permit_sectors_path: default_permit_sectors_path(),
            system_filter_path: default_system_filter_path(),
        }
    }
}
