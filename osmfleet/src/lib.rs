#![cfg_attr(
    test,
    expect(clippy::expect_used, reason = "tests require contextual panics")
)]
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]
//! Ingestion control loop for a fleet of per-region OSM-schema databases.
//!
//! The crate composes a small set of cooperating components: an extract
//! fetcher, an importer driver, a database provisioner, a fleet registry,
//! a reconciler, a deployment syncer and a telemetry sink, all orchestrated
//! by the top-level control loop in [`domain::control_loop`].

pub mod config;
pub mod domain;
pub mod outbound;
