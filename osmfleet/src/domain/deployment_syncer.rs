//! Deployment Syncer (C7): keeps tile-server deployments aligned with the
//! set of ready databases (§4.5).

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::domain::ports::{DatabaseInventory, DeploymentSet, enumerate_ready};

/// Ensures one deployment exists per ready database and removes deployments
/// for databases that have disappeared. A pure set reconciliation: no state
/// is cached locally, so repeated calls self-heal against missed events.
pub struct DeploymentSyncer {
    inventory: Arc<dyn DatabaseInventory>,
    deployments: Arc<dyn DeploymentSet>,
}

impl DeploymentSyncer {
    /// Build a syncer over the given ports.
    #[must_use]
    pub const fn new(inventory: Arc<dyn DatabaseInventory>, deployments: Arc<dyn DeploymentSet>) -> Self {
        Self {
            inventory,
            deployments,
        }
    }

    /// Run one sync pass.
    pub async fn sync(&self) {
        let ready = match enumerate_ready(self.inventory.as_ref()).await {
            Ok(ready) => ready,
            Err(error) => {
                warn!(%error, "deployment sync: could not enumerate ready databases");
                return;
            }
        };
        let existing = match self.deployments.list().await {
            Ok(existing) => existing,
            Err(error) => {
                warn!(%error, "deployment sync: could not list deployments");
                return;
            }
        };

        let ready_names: HashSet<&str> = ready.iter().map(|db| db.name.as_str()).collect();
        let existing_names: HashSet<&str> =
            existing.iter().map(|d| d.database_name.as_str()).collect();

        for name in &ready_names {
            if !existing_names.contains(name) {
                if let Err(error) = self.deployments.ensure_for(name).await {
                    warn!(db = %name, %error, "failed to create deployment, retrying next cycle");
                }
            }
        }

        for name in &existing_names {
            if !ready_names.contains(name) {
                if let Err(error) = self.deployments.remove_for(name).await {
                    warn!(db = %name, %error, "failed to remove deployment, retrying next cycle");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::model::{DbStatus, ManagedDatabase, TileDeployment};
    use crate::domain::ports::{MockDatabaseInventory, MockDeploymentSet};

    use super::*;

    fn db(name: &str, status: DbStatus) -> ManagedDatabase {
        ManagedDatabase {
            name: name.to_owned(),
            dsn: format!("postgres://x/{name}"),
            dsn_init: "postgres://x/postgres".to_owned(),
            status,
        }
    }

    #[tokio::test]
    async fn creates_deployment_for_newly_ready_database() {
        let mut inventory = MockDatabaseInventory::new();
        inventory
            .expect_enumerate()
            .returning(|| Ok(vec![db("db1", DbStatus::HasMapData)]));

        let mut deployments = MockDeploymentSet::new();
        deployments.expect_list().returning(|| Ok(vec![]));
        deployments
            .expect_ensure_for()
            .withf(|name| name == "db1")
            .times(1)
            .returning(|_| Ok(()));

        let syncer = DeploymentSyncer::new(Arc::new(inventory), Arc::new(deployments));
        syncer.sync().await;
    }

    #[tokio::test]
    async fn removes_deployment_for_disappeared_database() {
        let mut inventory = MockDatabaseInventory::new();
        inventory.expect_enumerate().returning(|| Ok(vec![]));

        let mut deployments = MockDeploymentSet::new();
        deployments.expect_list().returning(|| {
            Ok(vec![TileDeployment {
                database_name: "gone".to_owned(),
            }])
        });
        deployments
            .expect_remove_for()
            .withf(|name| name == "gone")
            .times(1)
            .returning(|_| Ok(()));

        let syncer = DeploymentSyncer::new(Arc::new(inventory), Arc::new(deployments));
        syncer.sync().await;
    }

    #[tokio::test]
    async fn stable_set_converges_with_no_create_or_delete_calls() {
        let mut inventory = MockDatabaseInventory::new();
        inventory
            .expect_enumerate()
            .returning(|| Ok(vec![db("db1", DbStatus::HasMapData)]));

        let mut deployments = MockDeploymentSet::new();
        deployments.expect_list().returning(|| {
            Ok(vec![TileDeployment {
                database_name: "db1".to_owned(),
            }])
        });
        deployments.expect_ensure_for().times(0);
        deployments.expect_remove_for().times(0);

        let syncer = DeploymentSyncer::new(Arc::new(inventory), Arc::new(deployments));
        syncer.sync().await;
    }
}
