//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod database_admin;
mod database_inventory;
mod deployment_set;
mod extra_data_loader;
mod extract_source;
mod importer_process;
mod sleeper;
mod telemetry_sink;

#[cfg(test)]
pub use database_admin::MockDatabaseAdmin;
pub use database_admin::{DatabaseAdmin, DatabaseAdminError, FixtureDatabaseAdmin};
#[cfg(test)]
pub use database_inventory::MockDatabaseInventory;
pub use database_inventory::{
    DatabaseInventory, DatabaseInventoryError, FixtureDatabaseInventory, enumerate_ready,
};
#[cfg(test)]
pub use deployment_set::MockDeploymentSet;
pub use deployment_set::{DeploymentSet, DeploymentSetError, FixtureDeploymentSet};
#[cfg(test)]
pub use extra_data_loader::MockExtraDataLoader;
pub use extra_data_loader::{ExtraDataLoader, ExtraDataLoaderError, NullExtraDataLoader};
#[cfg(test)]
pub use extract_source::MockExtractSource;
pub use extract_source::{ExtractSource, ExtractSourceError, FixtureExtractSource};
#[cfg(test)]
pub use importer_process::MockImporterProcess;
pub use importer_process::{
    CacheMode, FixtureImporterProcess, ImporterProcess, ImporterProcessError, ReadInvocation,
};
#[cfg(test)]
pub use sleeper::MockSleeper;
pub use sleeper::{Sleeper, TokioSleeper};
#[cfg(test)]
pub use telemetry_sink::MockTelemetrySink;
pub use telemetry_sink::{NullTelemetrySink, TelemetrySink, TelemetrySinkError};
