//! Control Loop (C8): top-level periodic driver (§4.7).
//!
//! ```text
//! initial ← true
//! loop forever:
//!   if dynamic_db: C7.sync()
//!   updated ← C2.fetch_all()
//!   if always_update: updated ← true
//!   fetch_budget ← cycle_delay
//!   while fetch_budget ≥ 0:
//!     C6.reconcile(updated ∨ initial)
//!     updated ← false
//!     initial ← false
//!     if dynamic_db: C7.sync()
//!     sleep(rescan_delay)
//!     fetch_budget ← fetch_budget − rescan_delay
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::domain::deployment_syncer::DeploymentSyncer;
use crate::domain::extract_fetcher::ExtractFetcher;
use crate::domain::model::Extract;
use crate::domain::ports::Sleeper;
use crate::domain::reconciler::Reconciler;

/// Parameters governing the loop's cadence and feature toggles.
pub struct ControlLoopConfig {
    /// Outer cycle delay between fetches.
    pub cycle_delay: Duration,
    /// Inner delay between reconciliations.
    pub rescan_delay: Duration,
    /// Whether fleet registry / deployment syncer integration is enabled.
    pub dynamic_db: bool,
    /// Whether `updated` is forced true every cycle.
    pub always_update: bool,
    /// Extracts to fetch each outer cycle.
    pub extracts: Vec<Extract>,
}

/// Drives the fetch → reconcile → sync → sleep cadence until shutdown is
/// requested.
pub struct ControlLoop {
    fetcher: Arc<ExtractFetcher>,
    reconciler: Arc<Reconciler>,
    deployment_syncer: Option<Arc<DeploymentSyncer>>,
    sleeper: Arc<dyn Sleeper>,
    config: ControlLoopConfig,
}

impl ControlLoop {
    /// Build a control loop from its collaborators and configuration.
    #[must_use]
    pub fn new(
        fetcher: Arc<ExtractFetcher>,
        reconciler: Arc<Reconciler>,
        deployment_syncer: Option<Arc<DeploymentSyncer>>,
        sleeper: Arc<dyn Sleeper>,
        config: ControlLoopConfig,
    ) -> Self {
        Self {
            fetcher,
            reconciler,
            deployment_syncer,
            sleeper,
            config,
        }
    }

    /// Run until `shutdown` observes `true`. Checked between phases only;
    /// no mid-phase cancellation protocol is provided, matching §5.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut initial = true;
        while !*shutdown.borrow() {
            self.sync_deployments_if_enabled().await;

            let mut updated = self.fetcher.fetch_all(&self.config.extracts).await;
            if self.config.always_update {
                updated = true;
            }

            let mut fetch_budget = self.config.cycle_delay;
            loop {
                if *shutdown.borrow() {
                    return;
                }
                self.reconciler.reconcile(updated || initial, initial).await;
                updated = false;
                initial = false;

                self.sync_deployments_if_enabled().await;

                if self.wait_or_shutdown(&mut shutdown).await {
                    return;
                }

                fetch_budget = fetch_budget.saturating_sub(self.config.rescan_delay);
                if fetch_budget.is_zero() {
                    break;
                }
            }
        }
        info!("control loop: shutdown requested, exiting");
    }

    async fn sync_deployments_if_enabled(&self) {
        if self.config.dynamic_db {
            if let Some(syncer) = &self.deployment_syncer {
                syncer.sync().await;
            }
        }
    }

    /// Sleep for `rescan_delay`, returning early (with `true`) if shutdown
    /// is requested mid-sleep.
    async fn wait_or_shutdown(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            () = self.sleeper.sleep(self.config.rescan_delay) => false,
            result = shutdown.changed() => result.is_err() || *shutdown.borrow(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::ports::{
        FixtureDatabaseAdmin, FixtureDatabaseInventory, FixtureExtractSource,
        FixtureImporterProcess, NullExtraDataLoader, NullTelemetrySink,
    };
    use crate::domain::provisioner::Provisioner;
    use crate::domain::reconciler::{ReconcilerConfig, ReconcilerPorts};
    use crate::domain::telemetry::TelemetryRecorder;

    struct ImmediateSleeper {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Sleeper for ImmediateSleeper {
        async fn sleep(&self, _duration: Duration) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn stops_promptly_once_shutdown_is_signalled() {
        let fetcher = Arc::new(ExtractFetcher::new(
            Arc::new(FixtureExtractSource),
            std::env::temp_dir(),
        ));
        let reconciler = Arc::new(Reconciler::new(
            ReconcilerPorts {
                inventory: Arc::new(FixtureDatabaseInventory::new(vec![])),
                extra_data_loader: Arc::new(NullExtraDataLoader),
            },
            Provisioner::new(Arc::new(FixtureDatabaseAdmin)),
            crate::domain::importer::ImporterDriver::new(Arc::new(FixtureImporterProcess)),
            TelemetryRecorder::new(Arc::new(NullTelemetrySink)),
            ReconcilerConfig {
                extracts: vec![],
                pbf_dir: std::env::temp_dir(),
                extra_data_dir: None,
            },
        ));
        let sleeper = Arc::new(ImmediateSleeper {
            calls: AtomicUsize::new(0),
        });
        let control_loop = ControlLoop::new(
            fetcher,
            reconciler,
            None,
            sleeper,
            ControlLoopConfig {
                cycle_delay: Duration::from_secs(1),
                rescan_delay: Duration::from_millis(1),
                dynamic_db: false,
                always_update: false,
                extracts: vec![],
            },
        );

        let (tx, rx) = watch::channel(false);
        tx.send(true).expect("send should succeed");
        control_loop.run(rx).await;
    }
}
