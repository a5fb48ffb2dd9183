use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod global;

pub use global::{GlobalFlags, OutputFormat};

/// Top-level CLI parser for the `rse` binary.
#[derive(Debug, Parser)]
#[command(
    name = "rse",
    version,
    about = "Keep the catalog of systems without coordinates in sync with its feeds"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only, no progress)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ./rse.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            config: self.config.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize the catalog with the systems dump
    Sync(SyncArgs),
    /// Reconcile navigation beacon claims
    Beacons,
    /// Show catalog counts
    Status,
    /// Check every row against the soft-delete invariant
    Verify,
    /// List names parked for manual review
    Ambiguous,
}

impl Commands {
    /// Commands that commit to the catalog and need the write lock.
    #[must_use]
    pub const fn writes_catalog(&self) -> bool {
        matches!(self, Self::Sync(_) | Self::Beacons)
    }
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Discard the catalog and rebuild it from the dump
    #[arg(long)]
    pub full: bool,

    /// Use the cached dump even if it is older than the TTL
    #[arg(long)]
    pub skip_download: bool,
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "rse",
            "--format",
            "table",
            "--config",
            "ops/rse.toml",
            "--verbose",
            "sync",
            "--full",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.config.as_deref(), Some(Path::new("ops/rse.toml")));
        assert!(cli.verbose);
        let Commands::Sync(args) = &cli.command else {
            panic!("expected sync, got {:?}", cli.command);
        };
        assert!(args.full);
        assert!(!args.skip_download);
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["rse", "status", "-q", "-f", "raw"]).expect("cli should parse");
        assert!(cli.quiet);
        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn only_sync_runs_take_the_write_lock() {
        let sync = Cli::try_parse_from(["rse", "sync"]).expect("cli should parse");
        let beacons = Cli::try_parse_from(["rse", "beacons"]).expect("cli should parse");
        let verify = Cli::try_parse_from(["rse", "verify"]).expect("cli should parse");

        assert!(sync.command.writes_catalog());
        assert!(beacons.command.writes_catalog());
        assert!(!verify.command.writes_catalog());
    }
}
