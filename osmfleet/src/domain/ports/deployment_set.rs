//! Port over the orchestrator's tile-server deployment management.
//!
//! Split out from [`super::database_inventory`] per §9: deployments are
//! derived from a template parameterized by the database name, not from
//! custom-resource status fields.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::model::TileDeployment;

define_port_error! {
    pub enum DeploymentSetError {
        Transport { message: String } => "deployment request failed: {message}",
    }
}

/// Lists, creates and removes tile-server deployments. No state is cached
/// locally, so repeated calls are self-healing against missed events (§4.5).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeploymentSet: Send + Sync {
    /// Snapshot of existing deployments.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentSetError`] on orchestrator read failure.
    async fn list(&self) -> Result<Vec<TileDeployment>, DeploymentSetError>;

    /// Create a deployment for `database_name` if it does not already
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentSetError`] on orchestrator write failure.
    async fn ensure_for(&self, database_name: &str) -> Result<(), DeploymentSetError>;

    /// Remove the deployment for `database_name`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentSetError`] on orchestrator write failure.
    async fn remove_for(&self, database_name: &str) -> Result<(), DeploymentSetError>;
}

/// No-op fixture for reconciler tests that do not exercise deployment sync.
pub struct FixtureDeploymentSet;

#[async_trait]
impl DeploymentSet for FixtureDeploymentSet {
    async fn list(&self) -> Result<Vec<TileDeployment>, DeploymentSetError> {
        Ok(Vec::new())
    }

    async fn ensure_for(&self, _database_name: &str) -> Result<(), DeploymentSetError> {
        Ok(())
    }

    async fn remove_for(&self, _database_name: &str) -> Result<(), DeploymentSetError> {
        Ok(())
    }
}
