//! Reqwest-backed extract source adapter.
//!
//! This adapter owns transport details only: conditional retrieval via
//! `If-Modified-Since`, streamed body writes and HTTP error mapping. The
//! "did it change" decision stays with the domain layer, which compares
//! filesystem timestamps before and after the call.

use std::path::Path;
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::domain::model::Extract;
use crate::domain::ports::{ExtractSource, ExtractSourceError};

const DEFAULT_USER_AGENT: &str = "osmfleetd/0.1";

/// Downloads extracts over HTTP, skipping the transfer when the server
/// reports the resource has not changed since the destination's existing
/// modification time.
pub struct ReqwestExtractSource {
    client: Client,
}

impl ReqwestExtractSource {
    /// Build an adapter using a reqwest client with the default identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(DEFAULT_USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ExtractSource for ReqwestExtractSource {
    async fn download(
        &self,
        extract: &Extract,
        destination: &Path,
    ) -> Result<(), ExtractSourceError> {
        let mut request = self.client.get(&extract.url);
        if let Some(modified) = existing_modified_http_date(destination) {
            request = request.header(reqwest::header::IF_MODIFIED_SINCE, modified);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(ExtractSourceError::transport(format!(
                "status {}",
                response.status().as_u16()
            )));
        }

        write_streamed(response, destination).await
    }
}

async fn write_streamed(
    response: reqwest::Response,
    destination: &Path,
) -> Result<(), ExtractSourceError> {
    let mut file = File::create(destination)
        .await
        .map_err(|error| ExtractSourceError::io(error.to_string()))?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_transport_error)?;
        file.write_all(&chunk)
            .await
            .map_err(|error| ExtractSourceError::io(error.to_string()))?;
    }
    file.flush()
        .await
        .map_err(|error| ExtractSourceError::io(error.to_string()))
}

fn existing_modified_http_date(path: &Path) -> Option<String> {
    let modified: SystemTime = std::fs::metadata(path).ok()?.modified().ok()?;
    let timestamp: DateTime<Utc> = modified.into();
    Some(timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}

fn map_transport_error(error: reqwest::Error) -> ExtractSourceError {
    if error.is_timeout() {
        ExtractSourceError::transport(format!("timed out: {error}"))
    } else {
        ExtractSourceError::transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn extract(name: &str, url: String) -> Extract {
        Extract {
            name: name.to_owned(),
            url,
        }
    }

    #[tokio::test]
    async fn downloads_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/region.osm.pbf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pbf-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().expect("tempdir should be created");
        let destination = dir.path().join("region.osm.pbf");
        let source = ReqwestExtractSource::new().expect("client should build");

        source
            .download(
                &extract("r1", format!("{}/region.osm.pbf", server.uri())),
                &destination,
            )
            .await
            .expect("download should succeed");

        assert_eq!(std::fs::read(&destination).expect("file should exist"), b"pbf-bytes");
    }

    #[tokio::test]
    async fn not_modified_leaves_destination_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/region.osm.pbf"))
            .respond_with(ResponseTemplate::new(304))
            .mount(&server)
            .await;

        let dir = tempdir().expect("tempdir should be created");
        let destination = dir.path().join("region.osm.pbf");
        std::fs::write(&destination, b"already-there").expect("seed file should write");
        let source = ReqwestExtractSource::new().expect("client should build");

        source
            .download(
                &extract("r1", format!("{}/region.osm.pbf", server.uri())),
                &destination,
            )
            .await
            .expect("download should succeed");

        assert_eq!(std::fs::read(&destination).expect("file should exist"), b"already-there");
    }

    #[tokio::test]
    async fn server_error_is_reported_as_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/region.osm.pbf"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempdir().expect("tempdir should be created");
        let destination = dir.path().join("region.osm.pbf");
        let source = ReqwestExtractSource::new().expect("client should build");

        let error = source
            .download(
                &extract("r1", format!("{}/region.osm.pbf", server.uri())),
                &destination,
            )
            .await
            .expect_err("503 should surface as an error");
        assert!(matches!(error, ExtractSourceError::Transport { .. }));
    }
}
