//! DB Provisioner (C4): creates target databases and installs SQL helpers.

use std::sync::Arc;

use crate::domain::ports::{DatabaseAdmin, DatabaseAdminError};

/// Thin composition over [`DatabaseAdmin`]. Both operations it exposes are
/// idempotent by contract (P4): a second call against an already-provisioned
/// database succeeds with no visible side effect.
pub struct Provisioner {
    admin: Arc<dyn DatabaseAdmin>,
}

impl Provisioner {
    /// Build a provisioner over the given admin adapter.
    #[must_use]
    pub fn new(admin: Arc<dyn DatabaseAdmin>) -> Self {
        Self { admin }
    }

    /// Create the target database, ensure required extensions and the
    /// supplementary table exist.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseAdminError`] on connection or DDL failure. Per
    /// §4.3, the caller (the reconciler) is responsible for rolling status
    /// back to INIT on any failure here.
    pub async fn provision_database(
        &self,
        dsn_init: &str,
        dsn: &str,
    ) -> Result<(), DatabaseAdminError> {
        self.admin.provision_database(dsn_init, dsn).await
    }

    /// Install the fixed SQL helper bodies against `dsn`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseAdminError`] if the helper files cannot be read or
    /// executed.
    pub async fn install_soundscape_sql(&self, dsn: &str) -> Result<(), DatabaseAdminError> {
        self.admin.install_soundscape_sql(dsn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockDatabaseAdmin;

    #[tokio::test]
    async fn provision_database_delegates_to_admin() {
        let mut admin = MockDatabaseAdmin::new();
        admin
            .expect_provision_database()
            .withf(|dsn_init, dsn| dsn_init == "postgres://admin" && dsn == "postgres://db1")
            .times(1)
            .returning(|_, _| Ok(()));
        let provisioner = Provisioner::new(Arc::new(admin));

        provisioner
            .provision_database("postgres://admin", "postgres://db1")
            .await
            .expect("provisioning should succeed");
    }

    #[tokio::test]
    async fn install_soundscape_sql_surfaces_admin_errors() {
        let mut admin = MockDatabaseAdmin::new();
        admin
            .expect_install_soundscape_sql()
            .times(1)
            .returning(|_| Err(DatabaseAdminError::ddl("syntax error".to_string())));
        let provisioner = Provisioner::new(Arc::new(admin));

        let result = provisioner.install_soundscape_sql("postgres://db1").await;
        assert!(result.is_err());
    }
}
