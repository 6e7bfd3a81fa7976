//! Minimal Kubernetes API server REST client.
//!
//! No crate in this codebase's lineage pulls in a full Kubernetes client
//! library, so the fleet registry and deployment set adapters talk to the
//! apiserver the same way the rest of this crate talks to any other HTTP
//! service: a plain `reqwest::Client` carrying a bearer token, following the
//! request/response mapping shape used throughout `outbound`.

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Credentials and endpoint needed to reach one cluster's apiserver.
#[derive(Clone)]
pub struct KubeApiConfig {
    /// Base URL of the apiserver, e.g. `https://kubernetes.default.svc`.
    pub api_server: Url,
    /// Bearer token presented on every request.
    pub token: String,
    /// Namespace every call is scoped to.
    pub namespace: String,
}

/// Thin REST client over the apiserver's JSON API.
#[derive(Clone)]
pub struct KubeApiClient {
    client: Client,
    config: KubeApiConfig,
}

/// Transport or decode failure talking to the apiserver.
#[derive(Debug, thiserror::Error)]
pub enum KubeApiError {
    /// The request could not be sent or the response could not be read.
    #[error("kubernetes api request failed: {0}")]
    Transport(String),
    /// The apiserver returned a non-2xx, non-404 status.
    #[error("kubernetes api returned status {status}: {body}")]
    Status {
        /// HTTP status code returned by the apiserver.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The response body did not decode as the expected type.
    #[error("kubernetes api response decode failed: {0}")]
    Decode(String),
}

impl KubeApiClient {
    /// Build a client from a reqwest client and endpoint configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client cannot be built.
    pub fn new(config: KubeApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .danger_accept_invalid_certs(false)
            .build()?;
        Ok(Self { client, config })
    }

    /// Namespace every call is scoped to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// `GET` a namespaced path relative to the apiserver root, returning
    /// `None` on a 404.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, KubeApiError> {
        let url = self
            .config
            .api_server
            .join(path)
            .map_err(|error| KubeApiError::Transport(error.to_string()))?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|error| KubeApiError::Transport(error.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode_success(response).await.map(Some)
    }

    /// `POST` a JSON body to a namespaced path.
    pub async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), KubeApiError> {
        let url = self
            .config
            .api_server
            .join(path)
            .map_err(|error| KubeApiError::Transport(error.to_string()))?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.token)
            .json(body)
            .send()
            .await
            .map_err(|error| KubeApiError::Transport(error.to_string()))?;
        decode_success::<serde_json::Value>(response).await.map(|_| ())
    }

    /// `PATCH` a namespaced path with a JSON merge patch body.
    pub async fn merge_patch<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), KubeApiError> {
        let url = self
            .config
            .api_server
            .join(path)
            .map_err(|error| KubeApiError::Transport(error.to_string()))?;
        let response = self
            .client
            .patch(url)
            .bearer_auth(&self.config.token)
            .header("Content-Type", "application/merge-patch+json")
            .json(body)
            .send()
            .await
            .map_err(|error| KubeApiError::Transport(error.to_string()))?;
        decode_success::<serde_json::Value>(response).await.map(|_| ())
    }

    /// `DELETE` a namespaced path. A 404 is treated as success.
    pub async fn delete(&self, path: &str) -> Result<(), KubeApiError> {
        let url = self
            .config
            .api_server
            .join(path)
            .map_err(|error| KubeApiError::Transport(error.to_string()))?;
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|error| KubeApiError::Transport(error.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        decode_success::<serde_json::Value>(response).await.map(|_| ())
    }
}

async fn decode_success<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, KubeApiError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|error| KubeApiError::Transport(error.to_string()))?;
    if !status.is_success() {
        return Err(KubeApiError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    serde_json::from_slice(&body).map_err(|error| KubeApiError::Decode(error.to_string()))
}
