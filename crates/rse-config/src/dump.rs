//! Dump transport configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_DUMP_URL: &str = "https://www.edsm.net/dump/systemsWithoutCoordinates.json";

fn default_url() -> String {
    DEFAULT_DUMP_URL.to_string()
}

fn default_cache_path() -> String {
    "systemsWithoutCoordinates.json".to_string()
}

/// 22 hours, so a daily job always sees a fresh dump.
const fn default_ttl_secs() -> u64 {
    60 * 60 * 22
}

const fn default_timeout_secs() -> u64 {
    600
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DumpConfig {
    /// Where the dump is downloaded from.
    #[serde(default = "default_url")]
    pub url: String,

    /// Local copy of the dump.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Local copies older than this are discarded and fetched again.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Upper bound on the whole download.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            cache_path: default_cache_path(),
            ttl_secs: default_ttl_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_edsm() {
        let config = DumpConfig::default();
        assert_eq!(config.url, DEFAULT_DUMP_URL);
        assert_eq!(config.ttl_secs, 79_200);
        assert_eq!(config.cache_path, "systemsWithoutCoordinates.json");
    }
}
