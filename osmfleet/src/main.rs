#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]
//! Entry point: parses the command line, wires ports to adapters, and runs
//! either a one-shot provisioning pass or the control loop described in
//! §4.7 until a termination signal arrives.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use osmfleet::config::{CliArgs, DaemonConfig, UpdateMode};
use osmfleet::domain::control_loop::{ControlLoop, ControlLoopConfig};
use osmfleet::domain::deployment_syncer::DeploymentSyncer;
use osmfleet::domain::extract_fetcher::ExtractFetcher;
use osmfleet::domain::importer::ImporterDriver;
use osmfleet::domain::model::{DbStatus, Extract, ManagedDatabase};
use osmfleet::domain::ports::{
    DatabaseAdmin, DatabaseInventory, DatabaseInventoryError, DeploymentSet, ExtraDataLoader,
    ExtractSource, FixtureDeploymentSet, FixtureImporterProcess, ImporterProcess,
    NullExtraDataLoader, NullTelemetrySink, TelemetrySink, TokioSleeper,
};
use osmfleet::domain::provisioner::Provisioner;
use osmfleet::domain::reconciler::{Reconciler, ReconcilerConfig, ReconcilerPorts};
use osmfleet::domain::telemetry::TelemetryRecorder;
use osmfleet::outbound::db::TokioPostgresAdmin;
use osmfleet::outbound::extra_data::TokioPostgresExtraDataLoader;
use osmfleet::outbound::extract::ReqwestExtractSource;
use osmfleet::outbound::importer::SubprocessImporterProcess;
use osmfleet::outbound::k8s::{KubeApiClient, KubeApiConfig, KubeDatabaseInventory, KubeDeploymentSet};
use osmfleet::outbound::metrics::{self, PrometheusTelemetrySink};

/// A single managed database backing a static, non-orchestrated deployment.
struct StaticInventory {
    dsn: String,
    dsn_init: String,
}

#[async_trait::async_trait]
impl DatabaseInventory for StaticInventory {
    async fn enumerate(&self) -> Result<Vec<ManagedDatabase>, DatabaseInventoryError> {
        Ok(vec![ManagedDatabase {
            name: "static".to_owned(),
            dsn: self.dsn.clone(),
            dsn_init: self.dsn_init.clone(),
            status: DbStatus::Init,
        }])
    }

    async fn set_status(&self, _name: &str, _status: DbStatus) -> Result<(), DatabaseInventoryError> {
        Ok(())
    }

    fn url_dsn(&self, dsn: &str) -> Result<String, DatabaseInventoryError> {
        Ok(dsn.to_owned())
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    if let Err(error) = tracing_subscriber::fmt().with_env_filter(filter).json().try_init() {
        eprintln!("tracing init failed: {error}");
    }
}

/// Load the extracts list document (§6): a JSON array of `{name, url}`
/// objects, optionally restricted to `where_names`.
fn load_extracts(path: &Path, where_names: &[String]) -> Result<Vec<Extract>, String> {
    let body = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
    let all: Vec<Extract> = serde_json::from_str(&body).map_err(|error| error.to_string())?;
    if where_names.is_empty() {
        return Ok(all);
    }
    Ok(all
        .into_iter()
        .filter(|extract| where_names.iter().any(|name| name == &extract.name))
        .collect())
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);
    let config = DaemonConfig::from(args);

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(message) => {
            error!(%message, "startup failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(config: DaemonConfig) -> Result<(), String> {
    let extracts = match &config.extracts_path {
        Some(path) => load_extracts(path, &config.where_names)?,
        None => Vec::new(),
    };

    let sql_helper_dir = config
        .ingest_dir
        .clone()
        .ok_or_else(|| "INGEST directory must be configured to install SQL helpers".to_owned())?;
    let admin: Arc<dyn DatabaseAdmin> = Arc::new(TokioPostgresAdmin::new(sql_helper_dir));
    let provisioner = Provisioner::new(admin);

    if config.provision_only {
        let dsn = config.static_dsn.ok_or("--provision requires --dsn")?;
        let dsn_init = config.static_dsn_init.ok_or("--provision requires --dsn-init")?;
        provisioner
            .provision_database(&dsn_init, &dsn)
            .await
            .map_err(|error| error.to_string())?;
        info!("provisioning complete");
        return Ok(());
    }

    let (inventory, deployments): (Arc<dyn DatabaseInventory>, Arc<dyn DeploymentSet>) =
        if config.dynamic_db {
            let namespace = config.namespace.clone().ok_or("--dynamic_db requires NAMESPACE")?;
            let api_server = std::env::var("KUBE_API_SERVER")
                .map_err(|_| "--dynamic_db requires KUBE_API_SERVER".to_owned())?;
            let token = std::env::var("KUBE_API_TOKEN")
                .map_err(|_| "--dynamic_db requires KUBE_API_TOKEN".to_owned())?;
            let tile_image = std::env::var("TILE_SERVER_IMAGE")
                .map_err(|_| "--dynamic_db requires TILE_SERVER_IMAGE".to_owned())?;
            let client = KubeApiClient::new(KubeApiConfig {
                api_server: api_server.parse().map_err(|error: url::ParseError| error.to_string())?,
                token,
                namespace,
            })
            .map_err(|error| error.to_string())?;
            let inventory: Arc<dyn DatabaseInventory> = Arc::new(KubeDatabaseInventory::new(client.clone()));
            let deployments: Arc<dyn DeploymentSet> =
                Arc::new(KubeDeploymentSet::new(client, tile_image));
            (inventory, deployments)
        } else {
            let dsn = config.static_dsn.clone().ok_or("static mode requires --dsn")?;
            let dsn_init = config
                .static_dsn_init
                .clone()
                .ok_or("static mode requires --dsn-init")?;
            let inventory: Arc<dyn DatabaseInventory> = Arc::new(StaticInventory { dsn, dsn_init });
            let deployments: Arc<dyn DeploymentSet> = Arc::new(FixtureDeploymentSet);
            (inventory, deployments)
        };

    let extract_source: Arc<dyn ExtractSource> =
        Arc::new(ReqwestExtractSource::new().map_err(|error| error.to_string())?);
    let pbf_dir = config
        .pbf_dir
        .clone()
        .ok_or_else(|| "--pbfdir must be configured".to_owned())?;
    let fetcher = Arc::new(ExtractFetcher::new(extract_source, pbf_dir));

    let importer_process: Arc<dyn ImporterProcess> = if config.skip_import {
        Arc::new(FixtureImporterProcess)
    } else {
        let mapping_path = config
            .mapping_path
            .clone()
            .ok_or_else(|| "--mapping must be configured".to_owned())?;
        let cache_dir = config
            .cache_dir
            .clone()
            .ok_or_else(|| "--cachedir must be configured".to_owned())?;
        Arc::new(SubprocessImporterProcess::new(
            config.imposm_path.clone(),
            mapping_path,
            cache_dir,
            config.diff_dir.clone(),
        ))
    };
    let importer = ImporterDriver::new(importer_process);

    let extra_data_loader: Arc<dyn ExtraDataLoader> = if config.extra_data_dir.is_some() {
        Arc::new(TokioPostgresExtraDataLoader)
    } else {
        Arc::new(NullExtraDataLoader)
    };

    let registry = Registry::new();
    let telemetry_sink: Arc<dyn TelemetrySink> = if config.telemetry_enabled {
        Arc::new(PrometheusTelemetrySink::new(&registry).map_err(|error| error.to_string())?)
    } else {
        Arc::new(NullTelemetrySink)
    };
    let telemetry = TelemetryRecorder::new(telemetry_sink);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reconciler = Arc::new(Reconciler::new(
        ReconcilerPorts {
            inventory: Arc::clone(&inventory),
            extra_data_loader,
        },
        provisioner,
        importer,
        telemetry,
        ReconcilerConfig {
            extracts: extracts.clone(),
            pbf_dir: config.pbf_dir.clone().unwrap_or_default(),
            extra_data_dir: config.extra_data_dir.clone(),
        },
    ));

    let deployment_syncer = if config.dynamic_db {
        Some(Arc::new(DeploymentSyncer::new(inventory, deployments)))
    } else {
        None
    };

    if config.telemetry_enabled {
        let telemetry_addr = SocketAddr::from(([0, 0, 0, 0], config.telemetry_port));
        let telemetry_shutdown = shutdown_rx.clone();
        let telemetry_registry = registry.clone();
        tokio::spawn(async move {
            if let Err(error) = metrics::serve(telemetry_addr, telemetry_registry, telemetry_shutdown).await {
                warn!(%error, "telemetry server exited with an error");
            }
        });
    }

    spawn_shutdown_listener(shutdown_tx);

    match config.update_mode {
        UpdateMode::None => {
            reconciler.reconcile(true, true).await;
        }
        UpdateMode::Imposmauto => {
            reconciler.reconcile(true, true).await;
            info!("imposmauto mode: incremental updates are delegated to the importer's own diff mode");
        }
        UpdateMode::Importloop => {
            let control_loop = ControlLoop::new(
                fetcher,
                reconciler,
                deployment_syncer,
                Arc::new(TokioSleeper),
                ControlLoopConfig {
                    cycle_delay: std::time::Duration::from_secs(config.cycle_delay_seconds),
                    rescan_delay: std::time::Duration::from_secs(config.rescan_delay_seconds),
                    dynamic_db: config.dynamic_db,
                    always_update: config.always_update,
                    extracts,
                },
            );
            control_loop.run(shutdown_rx).await;
        }
    }

    Ok(())
}

fn spawn_shutdown_listener(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
