//! Port for invoking the external importer as discrete phases.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    pub enum ImporterProcessError {
        Spawn { message: String } => "failed to spawn importer: {message}",
        NonZeroExit { phase: String, code: i32 } => "importer phase {phase} exited with status {code}",
        Terminated { phase: String } => "importer phase {phase} terminated by signal",
    }
}

/// Cache mode for the `read` phase (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Reset the on-disk cache before reading (first extract in a batch).
    Overwrite,
    /// Append to the existing on-disk cache (subsequent extracts).
    Append,
}

/// One invocation of the `read` phase for a single PBF file.
#[derive(Debug, Clone)]
pub struct ReadInvocation {
    /// Path to the PBF file to read into the cache.
    pub pbf_path: std::path::PathBuf,
    /// Whether this invocation overwrites or appends to the cache.
    pub cache_mode: CacheMode,
}

/// Drives the external importer tool through its phases. One instance is
/// bound to a fixed mapping/config/cache layout at construction time; the
/// target DSN for `write` and `rotate` is supplied per call so the driver
/// carries no per-database mutable state (§9, configuration-singleton note).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImporterProcess: Send + Sync {
    /// Run the `read` phase for one PBF file, populating the on-disk cache.
    ///
    /// # Errors
    ///
    /// Returns [`ImporterProcessError`] on spawn failure or non-zero exit.
    async fn read(&self, invocation: &ReadInvocation) -> Result<(), ImporterProcessError>;

    /// Materialize tables from the cache into the database identified by
    /// `target_dsn`.
    ///
    /// # Errors
    ///
    /// Returns [`ImporterProcessError`] on spawn failure or non-zero exit.
    async fn write(&self, target_dsn: &str) -> Result<(), ImporterProcessError>;

    /// Promote freshly written tables into production for `target_dsn`.
    ///
    /// # Errors
    ///
    /// Returns [`ImporterProcessError`] on spawn failure or non-zero exit.
    async fn rotate(&self, target_dsn: &str) -> Result<(), ImporterProcessError>;
}

/// No-op fixture whose phases always succeed without spawning a process.
pub struct FixtureImporterProcess;

#[async_trait]
impl ImporterProcess for FixtureImporterProcess {
    async fn read(&self, _invocation: &ReadInvocation) -> Result<(), ImporterProcessError> {
        Ok(())
    }

    async fn write(&self, _target_dsn: &str) -> Result<(), ImporterProcessError> {
        Ok(())
    }

    async fn rotate(&self, _target_dsn: &str) -> Result<(), ImporterProcessError> {
        Ok(())
    }
}
