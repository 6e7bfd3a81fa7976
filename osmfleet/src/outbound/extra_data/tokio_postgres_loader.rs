//! Loads non-OSM supplementary data from CSV files into tables named after
//! each file's stem, one `COPY` per file.

use std::path::Path;

use async_trait::async_trait;
use futures_util::SinkExt;
use tokio_postgres::NoTls;

use crate::domain::ports::{ExtraDataLoader, ExtraDataLoaderError};

/// Loads every `*.csv` file in a directory into a same-named table via
/// `COPY ... FROM STDIN`. Each file's header row provides its column names.
pub struct TokioPostgresExtraDataLoader;

#[async_trait]
impl ExtraDataLoader for TokioPostgresExtraDataLoader {
    async fn load(&self, source_dir: &Path, target_dsn: &str) -> Result<(), ExtraDataLoaderError> {
        let mut entries = tokio::fs::read_dir(source_dir)
            .await
            .map_err(|error| ExtraDataLoaderError::io(error.to_string()))?;

        let (client, connection) = tokio_postgres::connect(target_dsn, NoTls)
            .await
            .map_err(|error| ExtraDataLoaderError::load(error.to_string()))?;
        tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::warn!(%error, "postgres connection terminated with an error");
            }
        });

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|error| ExtraDataLoaderError::io(error.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(std::ffi::OsStr::to_str) != Some("csv") {
                continue;
            }
            load_one_file(&client, &path).await?;
        }
        Ok(())
    }
}

async fn load_one_file(
    client: &tokio_postgres::Client,
    path: &Path,
) -> Result<(), ExtraDataLoaderError> {
    let table = path
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(|| ExtraDataLoaderError::load(format!("invalid file name: {}", path.display())))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|error| ExtraDataLoaderError::io(error.to_string()))?;

    let statement = format!("COPY \"{table}\" FROM STDIN WITH (FORMAT csv, HEADER true)");
    let sink = client
        .copy_in(&statement)
        .await
        .map_err(|error| ExtraDataLoaderError::load(error.to_string()))?;
    futures_util::pin_mut!(sink);
    sink.send(bytes::Bytes::from(bytes))
        .await
        .map_err(|error| ExtraDataLoaderError::load(error.to_string()))?;
    sink.close()
        .await
        .map_err(|error| ExtraDataLoaderError::load(error.to_string()))
}
