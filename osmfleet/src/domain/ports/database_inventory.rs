//! Port over the orchestrator's per-database custom-resource-style status.
//!
//! Split out from deployment management per §9: the orchestrator client is
//! used for two unrelated shapes, so this port and [`super::deployment_set`]
//! model them as distinct capabilities.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::model::{DbStatus, ManagedDatabase};

define_port_error! {
    pub enum DatabaseInventoryError {
        Transport { message: String } => "orchestrator request failed: {message}",
        NotFound { name: String } => "database {name} not found",
    }
}

/// Enumerates managed databases and reads/writes their lifecycle status.
///
/// Treated as eventually consistent and best-effort: callers re-check
/// status before acting rather than trusting a cached snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseInventory: Send + Sync {
    /// Snapshot of the current fleet.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseInventoryError`] on orchestrator read failure.
    async fn enumerate(&self) -> Result<Vec<ManagedDatabase>, DatabaseInventoryError>;

    /// Persist the lifecycle tag for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseInventoryError`] on orchestrator write failure,
    /// which may be transient (connection expiry).
    async fn set_status(&self, name: &str, status: DbStatus) -> Result<(), DatabaseInventoryError>;

    /// Translate a native DSN to its URL form for use by the importer.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseInventoryError`] if the DSN cannot be translated.
    fn url_dsn(&self, dsn: &str) -> Result<String, DatabaseInventoryError>;
}

/// The subset of `inventory.enumerate()` whose status is `HASMAPDATA`.
///
/// # Errors
///
/// Returns [`DatabaseInventoryError`] on orchestrator read failure.
pub async fn enumerate_ready(
    inventory: &dyn DatabaseInventory,
) -> Result<Vec<ManagedDatabase>, DatabaseInventoryError> {
    Ok(inventory
        .enumerate()
        .await?
        .into_iter()
        .filter(|db| db.status.is_ready())
        .collect())
}

/// Fixture backed by a fixed, in-memory fleet snapshot.
pub struct FixtureDatabaseInventory {
    databases: Vec<ManagedDatabase>,
}

impl FixtureDatabaseInventory {
    /// Build a fixture over a fixed snapshot.
    #[must_use]
    pub fn new(databases: Vec<ManagedDatabase>) -> Self {
        Self { databases }
    }
}

#[async_trait]
impl DatabaseInventory for FixtureDatabaseInventory {
    async fn enumerate(&self) -> Result<Vec<ManagedDatabase>, DatabaseInventoryError> {
        Ok(self.databases.clone())
    }

    async fn set_status(
        &self,
        _name: &str,
        _status: DbStatus,
    ) -> Result<(), DatabaseInventoryError> {
        Ok(())
    }

    fn url_dsn(&self, dsn: &str) -> Result<String, DatabaseInventoryError> {
        Ok(dsn.to_owned())
    }
}

#[cfg(test)]
mod tests {
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
    async fn enumerate_ready_filters_to_hasmapdata() {
        let inventory = FixtureDatabaseInventory::new(vec![
            db("db1", DbStatus::HasMapData),
            db("db2", DbStatus::Provisioned),
        ]);
        let ready = enumerate_ready(&inventory)
            .await
            .expect("enumerate should succeed");
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].name, "db1");
    }
}
