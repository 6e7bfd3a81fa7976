//! tokio-postgres-backed database provisioning adapter (C4).

mod tokio_postgres_admin;

pub use tokio_postgres_admin::TokioPostgresAdmin;
