//! Importer Driver (C3): invokes the external importer as discrete phases.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::ports::{CacheMode, ImporterProcess, ImporterProcessError, ReadInvocation};

/// Drives the three importer phases against one fixed mapping/config/cache
/// layout. The target DSN for `write`/`rotate` is supplied per call rather
/// than stored, per the configuration-singleton redesign in §9.
pub struct ImporterDriver {
    process: Arc<dyn ImporterProcess>,
}

impl ImporterDriver {
    /// Build a driver over the given process adapter.
    #[must_use]
    pub fn new(process: Arc<dyn ImporterProcess>) -> Self {
        Self { process }
    }

    /// Run the `read` phase once for the whole batch, shared across all
    /// databases for this cycle. The first unique PBF basename in `paths`
    /// uses overwrite-cache mode; subsequent unique basenames use
    /// append-cache mode. Duplicate basenames are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ImporterProcessError`] on the first failing invocation;
    /// per §4.2, any phase failure aborts the batch without attempting the
    /// remaining reads.
    pub async fn read_batch(&self, paths: &[PathBuf]) -> Result<(), ImporterProcessError> {
        let mut seen_basenames = HashSet::new();
        let mut first = true;
        for path in paths {
            if !seen_basenames.insert(basename(path)) {
                continue;
            }
            let cache_mode = if first {
                CacheMode::Overwrite
            } else {
                CacheMode::Append
            };
            first = false;
            self.process
                .read(&ReadInvocation {
                    pbf_path: path.clone(),
                    cache_mode,
                })
                .await?;
        }
        Ok(())
    }

    /// Run `write` then `rotate` against `target_dsn`. Per §4.2, `write`
    /// must complete successfully before `rotate` is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ImporterProcessError`] if either phase fails; `rotate` is
    /// never attempted if `write` fails.
    pub async fn materialize(&self, target_dsn: &str) -> Result<(), ImporterProcessError> {
        self.process.write(target_dsn).await?;
        self.process.rotate(target_dsn).await
    }
}

fn basename(path: &Path) -> std::ffi::OsString {
    path.file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default()
}
