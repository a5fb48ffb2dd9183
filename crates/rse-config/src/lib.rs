//! # rse-config
//!
//! Layered configuration loading for the RSE catalog synchronizer using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`RSE_*` prefix, `__` as separator)
//! 2. An explicit `--config` file, or `./rse.toml`
//! 3. User-level `~/.config/rse/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `RSE_DATABASE__PATH` -> `database.path`,
//! `RSE_PIPELINE__WORKERS` -> `pipeline.workers`, etc.
//!
//! ```no_run
//! use rse_config::RseConfig;
//!
//! let config = RseConfig::load(None).expect("config");
//! config.require_database().expect("database.path must be set");
//! ```

mod database;
mod dump;
mod error;
mod feeds;
mod filters;
mod pipeline;

pub use database::DatabaseConfig;
pub use dump::{DEFAULT_DUMP_URL, DumpConfig};
pub use error::ConfigError;
pub use feeds::{BeaconConfig, ResolverConfig};
pub use filters::FilterConfig;
pub use pipeline::PipelineConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const LOCAL_CONFIG_FILE: &str = "rse.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RseConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub dump: DumpConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub beacons: BeaconConfig,
}

impl RseConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// `.env` files are not read here; the CLI loads them before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source fails to parse or extraction fails.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Explicit or working-directory config
        let local_path = config_file.map_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE), Path::to_path_buf);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("RSE_").split("__"))
    }

    /// Check value ranges. Presence of command-specific values is checked by
    /// the `require_*` methods.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero-sized pipeline settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("pipeline.workers", self.pipeline.workers),
            ("pipeline.batch_size", self.pipeline.batch_size),
            ("pipeline.queue_capacity", self.pipeline.queue_capacity),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when `database.path` is empty.
    pub fn require_database(&self) -> Result<&DatabaseConfig, ConfigError> {
        if self.database.is_configured() {
            Ok(&self.database)
        } else {
            Err(ConfigError::NotConfigured {
                field: "database.path".to_string(),
            })
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when `resolver.known_systems_path` is empty.
    pub fn require_resolver(&self) -> Result<&ResolverConfig, ConfigError> {
        if self.resolver.is_configured() {
            Ok(&self.resolver)
        } else {
            Err(ConfigError::NotConfigured {
                field: "resolver.known_systems_path".to_string(),
            })
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when `beacons.url` is empty.
    pub fn require_beacons(&self) -> Result<&BeaconConfig, ConfigError> {
        if self.beacons.is_configured() {
            Ok(&self.beacons)
        } else {
            Err(ConfigError::NotConfigured {
                field: "beacons.url".to_string(),
            })
        }
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rse").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_incomplete() {
        let config = RseConfig::default();
        assert!(config.require_database().is_err());
        assert!(config.require_resolver().is_err());
        assert!(config.require_beacons().is_err());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut config = RseConfig::default();
        config.pipeline.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "pipeline.batch_size"));
    }

    #[test]
    fn not_configured_names_the_field() {
        let err = RseConfig::default().require_database().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration value 'database.path' is not configured"
        );
    }
}
