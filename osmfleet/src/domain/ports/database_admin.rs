//! Port for provisioning one managed database (C4).

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    pub enum DatabaseAdminError {
        Connection { message: String } => "database connection failed: {message}",
        Ddl { message: String } => "DDL execution failed: {message}",
        Io { message: String } => "SQL helper file read failed: {message}",
    }
}

/// Provisions databases and installs the fixed SQL helper bodies.
///
/// Both operations are idempotent: a second call against a database already
/// at the target state succeeds with no visible side effect (P4).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseAdmin: Send + Sync {
    /// Create the target database if absent, then ensure the spatial and
    /// hstore extensions and the supplementary non-OSM table exist.
    ///
    /// `dsn_init` is the administrative connection on the same host as
    /// `dsn`; a "database already exists" error from the create step is
    /// swallowed rather than surfaced.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseAdminError`] for connection or DDL failures other
    /// than "already exists".
    async fn provision_database(
        &self,
        dsn_init: &str,
        dsn: &str,
    ) -> Result<(), DatabaseAdminError>;

    /// Execute the `postgis-vt-util.sql` and `tilefunc.sql` bodies from the
    /// configured SQL helper directory against `dsn`. Re-runnable.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseAdminError`] if the helper files cannot be read or
    /// their bodies fail to execute.
    async fn install_soundscape_sql(&self, dsn: &str) -> Result<(), DatabaseAdminError>;
}

/// No-op fixture for reconciler tests that do not exercise provisioning.
pub struct FixtureDatabaseAdmin;

#[async_trait]
impl DatabaseAdmin for FixtureDatabaseAdmin {
    async fn provision_database(
        &self,
        _dsn_init: &str,
        _dsn: &str,
    ) -> Result<(), DatabaseAdminError> {
        Ok(())
    }

    async fn install_soundscape_sql(&self, _dsn: &str) -> Result<(), DatabaseAdminError> {
        Ok(())
    }
}
