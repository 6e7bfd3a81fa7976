//! Extract Fetcher (C2): downloads OSM PBF extracts and reports whether any
//! of them changed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::warn;

use crate::domain::model::Extract;
use crate::domain::ports::ExtractSource;

/// Downloads a batch of extracts into a fixed local directory, reporting the
/// logical OR of each extract's "changed" bit.
///
/// # Algorithm
/// For each extract: record the pre-existing modification timestamp of the
/// local file (or "absent"); perform a conditional download; record the
/// post-download timestamp. If the timestamps differ, including
/// absent-to-present, the extract is "changed". Per-extract failures are
/// logged and treated as "not changed"; they never abort the batch.
pub struct ExtractFetcher {
    source: Arc<dyn ExtractSource>,
    pbf_dir: PathBuf,
}

impl ExtractFetcher {
    /// Build a fetcher that writes into `pbf_dir`.
    #[must_use]
    pub fn new(source: Arc<dyn ExtractSource>, pbf_dir: PathBuf) -> Self {
        Self { source, pbf_dir }
    }

    /// Download every extract, returning `true` if any of them changed.
    pub async fn fetch_all(&self, extracts: &[Extract]) -> bool {
        let mut any_changed = false;
        for extract in extracts {
            let destination = extract.cache_path(&self.pbf_dir);
            if self.fetch_one(extract, &destination).await {
                any_changed = true;
            }
        }
        any_changed
    }

    async fn fetch_one(&self, extract: &Extract, destination: &Path) -> bool {
        let before = modified_time(destination);
        if let Err(error) = self.source.download(extract, destination).await {
            warn!(extract = %extract.name, %error, "extract download failed, treating as unchanged");
            return false;
        }
        let after = modified_time(destination);
        before != after
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok()?.modified().ok()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::tempdir;

    use super::*;
    use crate::domain::ports::ExtractSourceError;

    struct WritingSource {
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl ExtractSource for WritingSource {
        async fn download(
            &self,
            _extract: &Extract,
            destination: &Path,
        ) -> Result<(), ExtractSourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after == Some(call) {
                return Err(ExtractSourceError::transport("boom".to_string()));
            }
            std::fs::write(destination, b"pbf-bytes")
                .map_err(|error| ExtractSourceError::io(error.to_string()))
        }
    }

    fn extract(name: &str) -> Extract {
        Extract {
            name: name.to_owned(),
            url: format!("http://example.invalid/{name}.osm.pbf"),
        }
    }

    #[tokio::test]
    async fn reports_changed_when_file_newly_created() {
        let dir = tempdir().expect("tempdir should be created");
        let source = Arc::new(WritingSource {
            calls: AtomicUsize::new(0),
            fail_after: None,
        });
        let fetcher = ExtractFetcher::new(source, dir.path().to_path_buf());

        let changed = fetcher.fetch_all(&[extract("r1")]).await;
        assert!(changed, "a newly created file should count as changed");
    }

    #[tokio::test]
    async fn per_extract_failure_does_not_abort_batch() {
        let dir = tempdir().expect("tempdir should be created");
        let source = Arc::new(WritingSource {
            calls: AtomicUsize::new(0),
            fail_after: Some(0),
        });
        let fetcher = ExtractFetcher::new(source, dir.path().to_path_buf());

        let changed = fetcher.fetch_all(&[extract("r1"), extract("r2")]).await;
        assert!(changed, "the second extract should still be downloaded");
        assert!(dir.path().join("r2.osm.pbf").exists());
        assert!(!dir.path().join("r1.osm.pbf").exists());
    }

    #[tokio::test]
    async fn no_changes_when_download_is_a_no_op() {
        let dir = tempdir().expect("tempdir should be created");
        let destination = dir.path().join("r1.osm.pbf");
        std::fs::write(&destination, b"already-there").expect("seed file should write");

        struct NoopSource;
        #[async_trait]
        impl ExtractSource for NoopSource {
            async fn download(
                &self,
                _extract: &Extract,
                _destination: &Path,
            ) -> Result<(), ExtractSourceError> {
                Ok(())
            }
        }

        let fetcher = ExtractFetcher::new(Arc::new(NoopSource), dir.path().to_path_buf());
        let changed = fetcher.fetch_all(&[extract("r1")]).await;
        assert!(!changed, "an untouched file should not be reported as changed");
    }
}
