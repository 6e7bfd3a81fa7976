//! Domain logic: the ingestion control loop and its component services.
//!
//! Purpose: define the components described by the orchestration contract
//! (extract fetcher, importer driver, provisioner, reconciler, deployment
//! syncer, control loop, telemetry) purely in terms of the ports in
//! [`ports`]. Nothing here knows about HTTP, Kubernetes, or subprocess
//! plumbing; those live under `crate::outbound`.

pub mod control_loop;
pub mod deployment_syncer;
pub mod error;
pub mod extract_fetcher;
pub mod importer;
pub mod model;
pub mod ports;
pub mod provisioner;
pub mod reconciler;
pub mod telemetry;

pub use error::{Error, ErrorCode};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use osmfleet::domain::{DomainResult, Error};
///
/// fn sample_operation() -> DomainResult<()> {
///     Err(Error::internal("boom"))
/// }
/// ```
pub type DomainResult<T> = Result<T, Error>;
