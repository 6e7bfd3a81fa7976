//! Port for downloading OSM extracts into the local cache directory.

use std::path::Path;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::model::Extract;

define_port_error! {
    pub enum ExtractSourceError {
        Transport { message: String } => "extract download failed: {message}",
        Io { message: String } => "extract cache write failed: {message}",
    }
}

/// Downloads one extract, performing conditional retrieval against the
/// destination's existing modification timestamp.
///
/// Implementations only overwrite `destination` when the remote resource is
/// newer; callers observe "changed" by comparing modification timestamps
/// before and after the call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractSource: Send + Sync {
    /// Download `extract` into `destination`, a full file path under the
    /// configured PBF directory.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractSourceError`] on transport or filesystem failure.
    /// Per §4.1, callers treat a per-extract failure as "not changed" for
    /// that extract rather than aborting the batch.
    async fn download(
        &self,
        extract: &Extract,
        destination: &Path,
    ) -> Result<(), ExtractSourceError>;
}

/// No-op fixture useful for wiring tests that never exercise downloads.
pub struct FixtureExtractSource;

#[async_trait]
impl ExtractSource for FixtureExtractSource {
    async fn download(
        &self,
        _extract: &Extract,
        _destination: &Path,
    ) -> Result<(), ExtractSourceError> {
        Ok(())
    }
}
