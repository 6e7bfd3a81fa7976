//! tokio-postgres-backed non-OSM data loader adapter.

mod tokio_postgres_loader;

pub use tokio_postgres_loader::TokioPostgresExtraDataLoader;
