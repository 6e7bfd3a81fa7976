//! tokio-postgres-backed database provisioning adapter (C4).

use std::path::PathBuf;

use async_trait::async_trait;
use tokio_postgres::NoTls;
use tokio_postgres::error::SqlState;

use crate::domain::ports::{DatabaseAdmin, DatabaseAdminError};

/// Provisions databases and installs the fixed SQL helper bodies over plain
/// TCP connections, one per call. The administrative connection
/// (`dsn_init`) is only used for `CREATE DATABASE`; every other statement
/// runs against the target database.
pub struct TokioPostgresAdmin {
    sql_helper_dir: PathBuf,
}

impl TokioPostgresAdmin {
    /// Build an adapter that reads SQL helper bodies from `sql_helper_dir`.
    #[must_use]
    pub fn new(sql_helper_dir: PathBuf) -> Self {
        Self { sql_helper_dir }
    }
}

#[async_trait]
impl DatabaseAdmin for TokioPostgresAdmin {
    async fn provision_database(
        &self,
        dsn_init: &str,
        dsn: &str,
    ) -> Result<(), DatabaseAdminError> {
        create_database_if_absent(dsn_init, database_name(dsn)).await?;

        let (client, connection) = tokio_postgres::connect(dsn, NoTls)
            .await
            .map_err(|error| DatabaseAdminError::connection(error.to_string()))?;
        tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::warn!(%error, "postgres connection terminated with an error");
            }
        });

        client
            .batch_execute(
                "CREATE EXTENSION IF NOT EXISTS postgis; \
                 CREATE EXTENSION IF NOT EXISTS hstore; \
                 CREATE TABLE IF NOT EXISTS soundscape_extra (\
                     id serial PRIMARY KEY, \
                     category text NOT NULL, \
                     payload jsonb NOT NULL\
                 );",
            )
            .await
            .map_err(|error| DatabaseAdminError::ddl(error.to_string()))
    }

    async fn install_soundscape_sql(&self, dsn: &str) -> Result<(), DatabaseAdminError> {
        let (client, connection) = tokio_postgres::connect(dsn, NoTls)
            .await
            .map_err(|error| DatabaseAdminError::connection(error.to_string()))?;
        tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::warn!(%error, "postgres connection terminated with an error");
            }
        });

        for filename in ["postgis-vt-util.sql", "tilefunc.sql"] {
            let body = tokio::fs::read_to_string(self.sql_helper_dir.join(filename))
                .await
                .map_err(|error| DatabaseAdminError::io(error.to_string()))?;
            client
                .batch_execute(&body)
                .await
                .map_err(|error| DatabaseAdminError::ddl(error.to_string()))?;
        }
        Ok(())
    }
}

async fn create_database_if_absent(
    dsn_init: &str,
    database_name: &str,
) -> Result<(), DatabaseAdminError> {
    let (client, connection) = tokio_postgres::connect(dsn_init, NoTls)
        .await
        .map_err(|error| DatabaseAdminError::connection(error.to_string()))?;
    tokio::spawn(async move {
        if let Err(error) = connection.await {
            tracing::warn!(%error, "postgres connection terminated with an error");
        }
    });

    let create = format!("CREATE DATABASE \"{database_name}\"");
    match client.batch_execute(&create).await {
        Ok(()) => Ok(()),
        Err(error) if error.code() == Some(&SqlState::DUPLICATE_DATABASE) => Ok(()),
        Err(error) => Err(DatabaseAdminError::ddl(error.to_string())),
    }
}

/// Extract the `dbname` component from a libpq key=value DSN.
fn database_name(dsn: &str) -> &str {
    dsn.split_whitespace()
        .find_map(|pair| pair.strip_prefix("dbname="))
        .unwrap_or("osm")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_name_reads_the_dbname_keyword() {
        assert_eq!(database_name("host=localhost dbname=osm user=osm"), "osm");
    }

    #[test]
    fn database_name_defaults_when_absent() {
        assert_eq!(database_name("host=localhost"), "osm");
    }
}
