//! Tile-server deployment adapter backed by Kubernetes `Deployment`
//! resources, parameterized from a fixed template by database name.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::KubeApiClient;
use crate::domain::model::TileDeployment;
use crate::domain::ports::{DeploymentSet, DeploymentSetError};

const MANAGED_LABEL_SELECTOR: &str = "app.kubernetes.io/managed-by=osmfleet,osmfleet.dev/role=tile-server";
const DATABASE_LABEL: &str = "osmfleet.dev/database";

#[derive(Debug, Deserialize)]
struct DeploymentList {
    items: Vec<Deployment>,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    #[serde(default)]
    labels: std::collections::HashMap<String, String>,
}

/// `DeploymentSet` backed by namespaced `Deployment` objects, one per
/// managed database, created from a fixed template.
pub struct KubeDeploymentSet {
    client: KubeApiClient,
    image: String,
}

impl KubeDeploymentSet {
    /// Build an adapter that creates deployments running `image`.
    #[must_use]
    pub fn new(client: KubeApiClient, image: String) -> Self {
        Self { client, image }
    }

    fn deployment_name(database_name: &str) -> String {
        format!("osmfleet-tiles-{database_name}")
    }

    fn list_path(&self) -> String {
        format!(
            "/apis/apps/v1/namespaces/{}/deployments?labelSelector={MANAGED_LABEL_SELECTOR}",
            self.client.namespace()
        )
    }

    fn create_path(&self) -> String {
        format!("/apis/apps/v1/namespaces/{}/deployments", self.client.namespace())
    }

    fn object_path(&self, database_name: &str) -> String {
        format!(
            "/apis/apps/v1/namespaces/{}/deployments/{}",
            self.client.namespace(),
            Self::deployment_name(database_name)
        )
    }

    fn template(&self, database_name: &str) -> Value {
        let name = Self::deployment_name(database_name);
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": name,
                "labels": {
                    "app.kubernetes.io/managed-by": "osmfleet",
                    "osmfleet.dev/role": "tile-server",
                    DATABASE_LABEL: database_name,
                }
            },
            "spec": {
                "replicas": 1,
                "selector": { "matchLabels": { "app": name } },
                "template": {
                    "metadata": { "labels": { "app": name } },
                    "spec": {
                        "containers": [{
                            "name": "tile-server",
                            "image": self.image.clone(),
                            "env": [{ "name": "OSMFLEET_DATABASE", "value": database_name }],
                        }]
                    }
                }
            }
        })
    }
}

#[async_trait]
impl DeploymentSet for KubeDeploymentSet {
    async fn list(&self) -> Result<Vec<TileDeployment>, DeploymentSetError> {
        let list: DeploymentList = self
            .client
            .get(&self.list_path())
            .await
            .map_err(|error| DeploymentSetError::transport(error.to_string()))?
            .ok_or_else(|| DeploymentSetError::transport("deployment list returned 404".to_string()))?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|item| {
                item.metadata
                    .labels
                    .get(DATABASE_LABEL)
                    .cloned()
                    .map(|database_name| TileDeployment { database_name })
            })
            .collect())
    }

    async fn ensure_for(&self, database_name: &str) -> Result<(), DeploymentSetError> {
        let existing = self
            .client
            .get::<Value>(&self.object_path(database_name))
            .await
            .map_err(|error| DeploymentSetError::transport(error.to_string()))?;
        if existing.is_some() {
            return Ok(());
        }
        self.client
            .post(&self.create_path(), &self.template(database_name))
            .await
            .map_err(|error| DeploymentSetError::transport(error.to_string()))
    }

    async fn remove_for(&self, database_name: &str) -> Result<(), DeploymentSetError> {
        self.client
            .delete(&self.object_path(database_name))
            .await
            .map_err(|error| DeploymentSetError::transport(error.to_string()))
    }
}
