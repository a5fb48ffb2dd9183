//! Catalog database configuration.

use serde::{Deserialize, Serialize};

/// Default delay before re-running a failed validity probe.
const fn default_probe_retry_delay_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL catalog file, or `:memory:`.
    #[serde(default)]
    pub path: String,

    /// Delay before the single retry of the catalog validity probe.
    #[serde(default = "default_probe_retry_delay_ms")]
    pub probe_retry_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            probe_retry_delay_ms: default_probe_retry_delay_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.path.trim().is_empty()
    }

    /// Whether the catalog lives in memory only (tests, dry runs).
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = DatabaseConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.probe_retry_delay_ms, 500);
    }

    #[test]
    fn memory_path_detection() {
        let config = DatabaseConfig {
            path: ":memory:".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
        assert!(config.is_in_memory());
    }
}
