//! Reconciler (C6): drives each managed database through its lifecycle
//! state machine (§4.6).

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::error::Error;
use crate::domain::importer::ImporterDriver;
use crate::domain::model::{DbStatus, Extract, ManagedDatabase};
use crate::domain::ports::{DatabaseInventory, ExtraDataLoader};
use crate::domain::provisioner::Provisioner;
use crate::domain::telemetry::TelemetryRecorder;
use crate::domain::DomainResult;

/// Number of in-place retry attempts for the HASMAPDATA status write in
/// phase P3, per the error-handling design's bounded-retry rule.
const SET_STATUS_MAX_ATTEMPTS: u32 = 5;

/// Collaborators the reconciler drives. Grouped into one bundle so
/// constructing a [`Reconciler`] reads as "here are its dependencies"
/// rather than a long positional argument list.
pub struct ReconcilerPorts {
    /// Fleet registry view over per-database status.
    pub inventory: Arc<dyn DatabaseInventory>,
    /// Optional non-OSM data loader, used when `extra_data_dir` is set.
    pub extra_data_loader: Arc<dyn ExtraDataLoader>,
}

/// Static, cycle-independent configuration the reconciler needs to compute
/// the shared PBF batch and per-database materialize steps.
pub struct ReconcilerConfig {
    /// Extracts this process was configured with (already filtered by
    /// `--where`, if any).
    pub extracts: Vec<Extract>,
    /// Directory extracts are downloaded into.
    pub pbf_dir: PathBuf,
    /// Optional non-OSM CSV directory.
    pub extra_data_dir: Option<PathBuf>,
}

/// Drives provisioning, batch import and per-database materialize for one
/// reconciliation cycle.
pub struct Reconciler {
    ports: ReconcilerPorts,
    provisioner: Provisioner,
    importer: ImporterDriver,
    telemetry: TelemetryRecorder,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Build a reconciler from its ports, services and static config.
    #[must_use]
    pub fn new(
        ports: ReconcilerPorts,
        provisioner: Provisioner,
        importer: ImporterDriver,
        telemetry: TelemetryRecorder,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            ports,
            provisioner,
            importer,
            telemetry,
            config,
        }
    }

    /// Run one reconciliation pass. `updated` reflects whether the most
    /// recent fetch changed any extract; `initial` is true only for the
    /// first pass of the process.
    pub async fn reconcile(&self, updated: bool, initial: bool) {
        let Ok(mut databases) = self.ports.inventory.enumerate().await else {
            warn!("reconcile: fleet enumeration failed, skipping cycle");
            return;
        };

        self.phase_provision(&mut databases).await;

        if updated || initial {
            let paths = self
                .config
                .extracts
                .iter()
                .map(|extract| extract.cache_path(&self.config.pbf_dir))
                .collect::<Vec<_>>();
            let read_result = self
                .telemetry
                .time("batch_import_read", || self.importer.read_batch(&paths))
                .await;
            if let Err(error) = read_result {
                let error = Error::from(error);
                warn!(%error, transient = error.is_transient(), "batch read phase failed, skipping materialize this cycle");
                return;
            }
        }

        self.phase_materialize(&databases, updated, initial).await;
    }

    /// Provisions every `INIT` database, advancing each `db.status` in
    /// place on success so the same pass's materialize phase sees it as
    /// eligible without a second round-trip to the registry.
    async fn phase_provision(&self, databases: &mut [ManagedDatabase]) {
        for db in databases {
            if db.status != DbStatus::Init {
                continue;
            }
            info!(db = %db.name, "provisioning");
            let _ = self
                .ports
                .inventory
                .set_status(&db.name, DbStatus::Provisioning)
                .await;

            let provisioned = self
                .telemetry
                .time("provision", || {
                    self.provisioner.provision_database(&db.dsn_init, &db.dsn)
                })
                .await;

            match provisioned {
                Ok(()) => {
                    let _ = self
                        .ports
                        .inventory
                        .set_status(&db.name, DbStatus::Provisioned)
                        .await;
                    db.status = DbStatus::Provisioned;
                    info!(db = %db.name, "provisioned");
                }
                Err(error) => {
                    let error = Error::from(error);
                    if error.is_transient() {
                        warn!(db = %db.name, %error, "provisioning failed transiently, reverting to INIT for retry");
                    } else {
                        warn!(db = %db.name, %error, "provisioning failed, reverting to INIT");
                    }
                    let _ = self
                        .ports
                        .inventory
                        .set_status(&db.name, DbStatus::Init)
                        .await;
                }
            }
        }
    }

    async fn phase_materialize(&self, databases: &[ManagedDatabase], updated: bool, initial: bool) {
        for db in databases {
            if !db.status.is_materialize_eligible() {
                continue;
            }
            if db.status == DbStatus::HasMapData && !(updated || initial) {
                continue;
            }
            self.materialize_one(db).await;
        }
    }

    async fn materialize_one(&self, db: &ManagedDatabase) {
        let result = self.try_materialize_one(db).await;
        if let Err(error) = result {
            // A transient failure (connection loss, I/O) is worth retrying
            // on the next cycle without escalation; anything else indicates
            // a persistent problem (bad mapping, rejected DDL) that needs
            // operator attention.
            if error.is_transient() {
                warn!(db = %db.name, %error, "materialize failed transiently, will retry next cycle");
            } else {
                error!(db = %db.name, %error, "materialize failed, other databases continue");
            }
        }
    }

    async fn try_materialize_one(&self, db: &ManagedDatabase) -> DomainResult<()> {
        let url_dsn = self.ports.inventory.url_dsn(&db.dsn)?;

        self.telemetry
            .time("materialize", || self.importer.materialize(&url_dsn))
            .await?;

        if let Some(extra_data_dir) = &self.config.extra_data_dir {
            self.ports
                .extra_data_loader
                .load(extra_data_dir, &url_dsn)
                .await?;
        }

        self.provisioner.install_soundscape_sql(&db.dsn).await?;

        if !self.set_status_with_retry(&db.name, DbStatus::HasMapData).await {
            warn!(db = %db.name, "HASMAPDATA status write exhausted retries, status left unchanged");
        } else {
            info!(db = %db.name, "materialized");
        }
        Ok(())
    }

    /// Attempt `set_status` up to [`SET_STATUS_MAX_ATTEMPTS`] times.
    /// Returns whether the write eventually succeeded.
    async fn set_status_with_retry(&self, name: &str, status: DbStatus) -> bool {
        for attempt in 1..=SET_STATUS_MAX_ATTEMPTS {
            match self.ports.inventory.set_status(name, status).await {
                Ok(()) => return true,
                Err(error) if attempt < SET_STATUS_MAX_ATTEMPTS => {
                    warn!(db = %name, attempt, %error, "set_status failed, retrying");
                }
                Err(_) => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::ports::{
        FixtureDatabaseAdmin, NullExtraDataLoader, FixtureImporterProcess,
        FixtureDatabaseInventory, MockDatabaseInventory, NullTelemetrySink,
    };

    use super::*;

    fn db(name: &str, status: DbStatus) -> ManagedDatabase {
        ManagedDatabase {
            name: name.to_owned(),
            dsn: format!("postgres://x/{name}"),
            dsn_init: "postgres://x/postgres".to_owned(),
            status,
        }
    }

    fn build_reconciler(inventory: Arc<dyn DatabaseInventory>) -> Reconciler {
        Reconciler::new(
            ReconcilerPorts {
                inventory,
                extra_data_loader: Arc::new(NullExtraDataLoader),
            },
            Provisioner::new(Arc::new(FixtureDatabaseAdmin)),
            ImporterDriver::new(Arc::new(FixtureImporterProcess)),
            TelemetryRecorder::new(Arc::new(NullTelemetrySink)),
            ReconcilerConfig {
                extracts: vec![],
                pbf_dir: PathBuf::from("/tmp/pbf"),
                extra_data_dir: None,
            },
        )
    }

    #[tokio::test]
    async fn hasmapdata_is_skipped_when_nothing_changed() {
        let inventory = Arc::new(FixtureDatabaseInventory::new(vec![db(
            "db1",
            DbStatus::HasMapData,
        )]));
        let reconciler = build_reconciler(inventory);
        // No mock expectations beyond the fixture's no-ops; this asserts
        // the call completes without panicking when skip conditions hold.
        reconciler.reconcile(false, false).await;
    }

    #[tokio::test]
    async fn provisioning_reverts_to_init_on_failure() {
        let mut inventory = MockDatabaseInventory::new();
        inventory
            .expect_enumerate()
            .returning(|| Ok(vec![db("db1", DbStatus::Init)]));
        inventory
            .expect_set_status()
            .withf(|name, status| name == "db1" && *status == DbStatus::Provisioning)
            .times(1)
            .returning(|_, _| Ok(()));
        inventory
            .expect_set_status()
            .withf(|name, status| name == "db1" && *status == DbStatus::Init)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut admin = crate::domain::ports::MockDatabaseAdmin::new();
        admin
            .expect_provision_database()
            .returning(|_, _| Err(crate::domain::ports::DatabaseAdminError::ddl("boom".to_string())));

        let reconciler = Reconciler::new(
            ReconcilerPorts {
                inventory: Arc::new(inventory),
                extra_data_loader: Arc::new(NullExtraDataLoader),
            },
            Provisioner::new(Arc::new(admin)),
            ImporterDriver::new(Arc::new(FixtureImporterProcess)),
            TelemetryRecorder::new(Arc::new(NullTelemetrySink)),
            ReconcilerConfig {
                extracts: vec![],
                pbf_dir: PathBuf::from("/tmp/pbf"),
                extra_data_dir: None,
            },
        );

        reconciler.reconcile(false, true).await;
    }

    #[tokio::test]
    async fn freshly_provisioned_database_is_materialized_in_the_same_pass() {
        let mut inventory = MockDatabaseInventory::new();
        inventory
            .expect_enumerate()
            .returning(|| Ok(vec![db("db1", DbStatus::Init)]));
        inventory
            .expect_set_status()
            .withf(|name, status| name == "db1" && *status == DbStatus::Provisioning)
            .times(1)
            .returning(|_, _| Ok(()));
        inventory
            .expect_set_status()
            .withf(|name, status| name == "db1" && *status == DbStatus::Provisioned)
            .times(1)
            .returning(|_, _| Ok(()));
        inventory
            .expect_set_status()
            .withf(|name, status| name == "db1" && *status == DbStatus::HasMapData)
            .times(1)
            .returning(|_, _| Ok(()));
        inventory
            .expect_url_dsn()
            .returning(|dsn| Ok(dsn.to_owned()));

        let mut admin = crate::domain::ports::MockDatabaseAdmin::new();
        admin.expect_provision_database().returning(|_, _| Ok(()));
        admin.expect_install_soundscape_sql().returning(|_| Ok(()));

        let reconciler = Reconciler::new(
            ReconcilerPorts {
                inventory: Arc::new(inventory),
                extra_data_loader: Arc::new(NullExtraDataLoader),
            },
            Provisioner::new(Arc::new(admin)),
            ImporterDriver::new(Arc::new(FixtureImporterProcess)),
            TelemetryRecorder::new(Arc::new(NullTelemetrySink)),
            ReconcilerConfig {
                extracts: vec![],
                pbf_dir: PathBuf::from("/tmp/pbf"),
                extra_data_dir: None,
            },
        );

        // A fresh INIT database must reach HASMAPDATA within one pass, not
        // just PROVISIONED, so deployment sync can pick it up immediately.
        reconciler.reconcile(true, true).await;
    }
}
