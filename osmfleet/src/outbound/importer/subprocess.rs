//! Subprocess-backed importer driver, spawning the external import tool for
//! each phase (§4.2, §9 subprocess composition contract).

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::ports::{CacheMode, ImporterProcess, ImporterProcessError, ReadInvocation};

const SRID: &str = "4326";

/// Fixed layout the importer binary is invoked against. One instance is
/// bound to a mapping/cache/diff layout at construction; the write/rotate
/// target DSN is supplied per call.
pub struct SubprocessImporterProcess {
    executable: PathBuf,
    mapping_path: PathBuf,
    cache_dir: PathBuf,
    diff_dir: Option<PathBuf>,
}

impl SubprocessImporterProcess {
    /// Build a driver bound to one mapping/cache layout. `diff_dir` being
    /// `Some` enables incremental (`-diff`) mode on every phase.
    #[must_use]
    pub fn new(
        executable: PathBuf,
        mapping_path: PathBuf,
        cache_dir: PathBuf,
        diff_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            executable,
            mapping_path,
            cache_dir,
            diff_dir,
        }
    }

    fn append_diff_args(&self, args: &mut Vec<String>) {
        if let Some(diff_dir) = &self.diff_dir {
            args.push("-diff".to_owned());
            args.push("-diffdir".to_owned());
            args.push(diff_dir.display().to_string());
        }
    }

    async fn run(&self, phase: &str, args: Vec<String>) -> Result<(), ImporterProcessError> {
        let status = Command::new(&self.executable)
            .args(&args)
            .status()
            .await
            .map_err(|error| ImporterProcessError::spawn(error.to_string()))?;

        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) => Err(ImporterProcessError::non_zero_exit(phase.to_owned(), code)),
            None => Err(ImporterProcessError::terminated(phase.to_owned())),
        }
    }
}

#[async_trait]
impl ImporterProcess for SubprocessImporterProcess {
    async fn read(&self, invocation: &ReadInvocation) -> Result<(), ImporterProcessError> {
        let mut args = vec![
            "import".to_owned(),
            "-mapping".to_owned(),
            self.mapping_path.display().to_string(),
            "-read".to_owned(),
            invocation.pbf_path.display().to_string(),
            "-cachedir".to_owned(),
            self.cache_dir.display().to_string(),
        ];
        args.push(
            match invocation.cache_mode {
                CacheMode::Overwrite => "-overwritecache",
                CacheMode::Append => "-appendcache",
            }
            .to_owned(),
        );
        self.append_diff_args(&mut args);
        self.run("read", args).await
    }

    async fn write(&self, target_dsn: &str) -> Result<(), ImporterProcessError> {
        let mut args = vec![
            "import".to_owned(),
            "-mapping".to_owned(),
            self.mapping_path.display().to_string(),
            "-write".to_owned(),
            "-connection".to_owned(),
            target_dsn.to_owned(),
            "-srid".to_owned(),
            SRID.to_owned(),
            "-cachedir".to_owned(),
            self.cache_dir.display().to_string(),
        ];
        self.append_diff_args(&mut args);
        self.run("write", args).await
    }

    async fn rotate(&self, target_dsn: &str) -> Result<(), ImporterProcessError> {
        let mut args = vec![
            "import".to_owned(),
            "-mapping".to_owned(),
            self.mapping_path.display().to_string(),
            "-connection".to_owned(),
            target_dsn.to_owned(),
            "-srid".to_owned(),
            SRID.to_owned(),
            "-deployproduction".to_owned(),
            "-cachedir".to_owned(),
            self.cache_dir.display().to_string(),
        ];
        self.append_diff_args(&mut args);
        self.run("rotate", args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(diff_dir: Option<PathBuf>) -> SubprocessImporterProcess {
        SubprocessImporterProcess::new(
            PathBuf::from("/bin/true"),
            PathBuf::from("/etc/osmfleet/mapping.yml"),
            PathBuf::from("/tmp/imposm3"),
            diff_dir,
        )
    }

    #[tokio::test]
    async fn read_phase_succeeds_against_a_no_op_binary() {
        let driver = driver(None);
        driver
            .read(&ReadInvocation {
                pbf_path: PathBuf::from("/pbf/r1.osm.pbf"),
                cache_mode: CacheMode::Overwrite,
            })
            .await
            .expect("/bin/true should exit zero");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_with_the_failing_phase() {
        let driver = SubprocessImporterProcess::new(
            PathBuf::from("/bin/false"),
            PathBuf::from("/etc/osmfleet/mapping.yml"),
            PathBuf::from("/tmp/imposm3"),
            None,
        );
        let error = driver
            .write("postgres://x/db1")
            .await
            .expect_err("/bin/false should exit non-zero");
        assert!(matches!(
            error,
            ImporterProcessError::NonZeroExit { phase, .. } if phase == "write"
        ));
    }
}
