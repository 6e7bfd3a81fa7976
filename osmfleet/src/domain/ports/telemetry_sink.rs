//! Port for observing event durations and last-seen timestamps (C1).

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::model::TelemetryEvent;

define_port_error! {
    pub enum TelemetrySinkError {
        Registration { message: String } => "metric registration failed: {message}",
    }
}

/// Records timed events into a duration histogram and a last-occurrence
/// gauge, both keyed by `event_name`. Telemetry failures are swallowed by
/// callers per §7: this port's errors are only surfaced at construction
/// time, never from `record_event`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Record one occurrence. Implementations that back a disabled sink
    /// treat this as a no-op.
    async fn record_event(&self, event: &TelemetryEvent);
}

/// No-op sink used when `--telemetry` is not passed.
pub struct NullTelemetrySink;

#[async_trait]
impl TelemetrySink for NullTelemetrySink {
    async fn record_event(&self, _event: &TelemetryEvent) {}
}
