//! Typed configuration surface.
//!
//! Purpose: parse the command-line surface (§6 of the ingestion contract)
//! into an immutable [`DaemonConfig`] built once at startup. Nothing here
//! mutates a process-wide singleton; the per-database DSN used during
//! materialization is passed explicitly by the reconciler rather than
//! rewritten in place on a shared object.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Update-mode selection for the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum UpdateMode {
    /// Exit after the initial reconciliation pass.
    None,
    /// Delegate to the importer's own diff mode; not driven by this crate's
    /// control loop.
    Imposmauto,
    /// Run the fetch/reconcile/sync/sleep loop described in §4.7.
    Importloop,
}

/// Command-line surface for the ingestion daemon.
#[derive(Debug, Clone, Parser)]
#[command(name = "osmfleetd", about = "OSM fleet ingestion control loop")]
pub struct CliArgs {
    /// Suppress import phases entirely.
    #[arg(long)]
    pub skipimport: bool,

    /// Select update mode.
    #[arg(long, value_enum, default_value = "importloop")]
    pub updatemodel: UpdateMode,

    /// Load the extracts list at startup.
    #[arg(long)]
    pub sourceupdate: bool,

    /// Enable the telemetry sink and its HTTP server.
    #[arg(long)]
    pub telemetry: bool,

    /// Port the `/metrics` scrape endpoint listens on.
    #[arg(long, default_value_t = 8000)]
    pub telemetryport: u16,

    /// Outer cycle delay in seconds.
    #[arg(long, default_value_t = 28_800)]
    pub delay: u64,

    /// Path to the extracts list document.
    #[arg(long)]
    pub extracts: Option<PathBuf>,

    /// Importer mapping file path.
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Importer executable path.
    #[arg(long, default_value = "imposm")]
    pub imposm: PathBuf,

    /// Restrict extracts by name.
    #[arg(long = "where", value_delimiter = ',')]
    pub where_names: Vec<String>,

    /// Importer cache directory.
    #[arg(long)]
    pub cachedir: Option<PathBuf>,

    /// Importer diff directory (incremental mode).
    #[arg(long)]
    pub diffdir: Option<PathBuf>,

    /// Local PBF download directory.
    #[arg(long)]
    pub pbfdir: Option<PathBuf>,

    /// Importer expire-tiles directory.
    #[arg(long)]
    pub expiredir: Option<PathBuf>,

    /// Optional non-OSM CSV directory loaded after materialize.
    #[arg(long)]
    pub extradatadir: Option<PathBuf>,

    /// Importer config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run provisioning against `--dsn-init`/`--dsn` explicitly and exit.
    #[arg(long)]
    pub provision: bool,

    /// Default target DSN when not using dynamic database mode.
    #[arg(long)]
    pub dsn: Option<String>,

    /// Default administrative DSN when not using dynamic database mode.
    #[arg(long)]
    pub dsn_init: Option<String>,

    /// Enable fleet registry / deployment syncer integration.
    #[arg(long)]
    pub dynamic_db: bool,

    /// Force `updated = true` every cycle.
    #[arg(long)]
    pub always_update: bool,

    /// Lower the log threshold to informational.
    #[arg(long)]
    pub verbose: bool,

    /// Orchestrator namespace, used by the fleet registry.
    #[arg(long, env = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Directory containing the SQL helper bodies `postgis-vt-util.sql` and
    /// `tilefunc.sql`.
    #[arg(long, env = "INGEST")]
    pub ingest_dir: Option<PathBuf>,
}

/// Fixed seconds between inner reconciliation iterations.
pub const RESCAN_DELAY_SECONDS: u64 = 60;

/// Immutable, fully resolved configuration passed by value into every
/// component.
///
/// # Examples
/// ```
/// use osmfleet::config::{CliArgs, DaemonConfig, UpdateMode};
/// use clap::Parser;
///
/// let args = CliArgs::parse_from(["osmfleetd", "--updatemodel", "none"]);
/// let config = DaemonConfig::from(args);
/// assert!(matches!(config.update_mode, UpdateMode::None));
/// ```
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Whether import phases are suppressed.
    pub skip_import: bool,
    /// Selected update mode.
    pub update_mode: UpdateMode,
    /// Whether the extracts list is (re)loaded at startup.
    pub source_update: bool,
    /// Whether telemetry is enabled.
    pub telemetry_enabled: bool,
    /// Port the `/metrics` scrape endpoint listens on.
    pub telemetry_port: u16,
    /// Outer cycle delay.
    pub cycle_delay_seconds: u64,
    /// Inner reconcile/sleep delay.
    pub rescan_delay_seconds: u64,
    /// Path to the extracts list document.
    pub extracts_path: Option<PathBuf>,
    /// Importer mapping file.
    pub mapping_path: Option<PathBuf>,
    /// Importer executable.
    pub imposm_path: PathBuf,
    /// Restriction subset by extract name; empty means "all".
    pub where_names: Vec<String>,
    /// Importer cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Importer diff directory; presence implies incremental mode.
    pub diff_dir: Option<PathBuf>,
    /// Local PBF download directory.
    pub pbf_dir: Option<PathBuf>,
    /// Importer expire-tiles directory.
    pub expire_dir: Option<PathBuf>,
    /// Optional non-OSM CSV directory.
    pub extra_data_dir: Option<PathBuf>,
    /// Importer config file.
    pub importer_config_path: Option<PathBuf>,
    /// Whether to run a one-shot explicit provisioning pass.
    pub provision_only: bool,
    /// Default static target DSN (non-dynamic mode).
    pub static_dsn: Option<String>,
    /// Default static administrative DSN (non-dynamic mode).
    pub static_dsn_init: Option<String>,
    /// Whether fleet registry / deployment syncer integration is enabled.
    pub dynamic_db: bool,
    /// Whether `updated` is forced true every cycle.
    pub always_update: bool,
    /// Orchestrator namespace.
    pub namespace: Option<String>,
    /// SQL helper body directory.
    pub ingest_dir: Option<PathBuf>,
}

impl From<CliArgs> for DaemonConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            skip_import: args.skipimport,
            update_mode: args.updatemodel,
            source_update: args.sourceupdate,
            telemetry_enabled: args.telemetry,
            telemetry_port: args.telemetryport,
            cycle_delay_seconds: args.delay,
            rescan_delay_seconds: RESCAN_DELAY_SECONDS,
            extracts_path: args.extracts,
            mapping_path: args.mapping,
            imposm_path: args.imposm,
            where_names: args.where_names,
            cache_dir: args.cachedir,
            diff_dir: args.diffdir,
            pbf_dir: args.pbfdir,
            expire_dir: args.expiredir,
            extra_data_dir: args.extradatadir,
            importer_config_path: args.config,
            provision_only: args.provision,
            static_dsn: args.dsn,
            static_dsn_init: args.dsn_init,
            dynamic_db: args.dynamic_db,
            always_update: args.always_update,
            namespace: args.namespace,
            ingest_dir: args.ingest_dir,
        }
    }
}

impl DaemonConfig {
    /// Whether incremental (diff-directory) mode is active.
    #[must_use]
    pub const fn incremental(&self) -> bool {
        self.diff_dir.is_some()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let args = CliArgs::parse_from(["osmfleetd"]);
        let config = DaemonConfig::from(args);
        assert_eq!(config.cycle_delay_seconds, 28_800);
        assert_eq!(config.rescan_delay_seconds, 60);
        assert_eq!(config.telemetry_port, 8000);
        assert!(matches!(config.update_mode, UpdateMode::Importloop));
        assert!(!config.incremental());
    }

    #[test]
    fn where_names_splits_on_comma() {
        let args = CliArgs::parse_from(["osmfleetd", "--where", "r1,r2"]);
        let config = DaemonConfig::from(args);
        assert_eq!(config.where_names, vec!["r1".to_owned(), "r2".to_owned()]);
    }

    #[test]
    fn diff_dir_enables_incremental_mode() {
        let args = CliArgs::parse_from(["osmfleetd", "--diffdir", "/var/diffs"]);
        let config = DaemonConfig::from(args);
        assert!(config.incremental());
    }
}
