//! Port for loading supplementary non-OSM data into a materialized
//! database, when `--extradatadir` is configured.

use std::path::Path;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    pub enum ExtraDataLoaderError {
        Io { message: String } => "extra data read failed: {message}",
        Load { message: String } => "extra data load failed: {message}",
    }
}

/// Loads CSV (or similarly shaped) non-OSM data from `source_dir` into the
/// database identified by `target_dsn`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtraDataLoader: Send + Sync {
    /// Load supplementary data.
    ///
    /// # Errors
    ///
    /// Returns [`ExtraDataLoaderError`] on read or load failure.
    async fn load(&self, source_dir: &Path, target_dsn: &str) -> Result<(), ExtraDataLoaderError>;
}

/// No-op loader used when `--extradatadir` is not configured.
pub struct NullExtraDataLoader;

#[async_trait]
impl ExtraDataLoader for NullExtraDataLoader {
    async fn load(&self, _source_dir: &Path, _target_dsn: &str) -> Result<(), ExtraDataLoaderError> {
        Ok(())
    }
}
