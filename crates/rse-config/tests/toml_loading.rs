//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed working directories and env vars.

use figment::Jail;
use rse_config::{ConfigError, RseConfig};

#[test]
fn loads_full_config_from_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "rse.toml",
            r#"
[database]
path = "catalog.db"
probe_retry_delay_ms = 10

[dump]
url = "http://localhost:8080/dump.json"
cache_path = "cache/dump.json"
ttl_secs = 3600

[filters]
permit_sectors_path = "lists/permit.txt"
system_filter_path = "lists/names.txt"

[pipeline]
workers = 3
batch_size = 500
queue_capacity = 2
resolve_timeout_ms = 250
use_dump_estimates = true

[resolver]
known_systems_path = "known.jsonl"

[beacons]
url = "http://localhost:8080/beacons.csv"
header_rows = 1
name_column = 0
"#,
        )?;

        let config = RseConfig::load(None).expect("config loads");
        assert_eq!(config.database.path, "catalog.db");
        assert_eq!(config.database.probe_retry_delay_ms, 10);
        assert_eq!(config.dump.url, "http://localhost:8080/dump.json");
        assert_eq!(config.dump.ttl_secs, 3600);
        assert_eq!(config.filters.permit_sectors_path, "lists/permit.txt");
        assert_eq!(config.pipeline.workers, 3);
        assert_eq!(config.pipeline.batch_size, 500);
        assert_eq!(config.pipeline.queue_capacity, 2);
        assert!(config.pipeline.use_dump_estimates);
        assert!(config.require_resolver().is_ok());
        assert_eq!(config.beacons.header_rows, 1);
        assert_eq!(config.beacons.name_column, 0);
        Ok(())
    });
}

#[test]
fn explicit_config_file_is_used() {
    Jail::expect_with(|jail| {
        jail.create_file("custom.toml", "[database]\npath = \"custom.db\"\n")?;
        jail.create_file("rse.toml", "[database]\npath = \"ignored.db\"\n")?;

        let config = RseConfig::load(Some(std::path::Path::new("custom.toml"))).expect("config loads");
        assert_eq!(config.database.path, "custom.db");
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("rse.toml", "[pipeline]\nbatch_size = 500\n")?;
        jail.set_env("RSE_PIPELINE__BATCH_SIZE", "42");
        jail.set_env("RSE_DATABASE__PATH", ":memory:");

        let config = RseConfig::load(None).expect("config loads");
        assert_eq!(config.pipeline.batch_size, 42);
        assert!(config.database.is_in_memory());
        Ok(())
    });
}

#[test]
fn partial_sections_keep_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("rse.toml", "[dump]\nttl_secs = 60\n")?;

        let config = RseConfig::load(None).expect("config loads");
        assert_eq!(config.dump.ttl_secs, 60);
        assert_eq!(config.dump.url, rse_config::DEFAULT_DUMP_URL);
        assert_eq!(config.pipeline.batch_size, 10_000);
        assert_eq!(config.beacons.header_rows, 3);
        Ok(())
    });
}

#[test]
fn zero_workers_fail_validation() {
    Jail::expect_with(|jail| {
        jail.set_env("RSE_PIPELINE__WORKERS", "0");
        let err = RseConfig::load(None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        Ok(())
    });
}

#[test]
fn malformed_toml_is_an_error() {
    Jail::expect_with(|jail| {
        jail.create_file("rse.toml", "[database\npath = ")?;
        assert!(matches!(
            RseConfig::load(None),
            Err(ConfigError::Figment(_))
        ));
        Ok(())
    });
}
