//! Prometheus-backed telemetry sink (C1): a duration histogram and a
//! last-occurrence gauge, both keyed by event name.

use async_trait::async_trait;
use prometheus::{HistogramVec, Registry};

use crate::domain::model::TelemetryEvent;
use crate::domain::ports::{TelemetrySink, TelemetrySinkError};

/// Records event durations into a histogram and last-seen timestamps into a
/// gauge, registered under a shared [`Registry`] exposed via the metrics
/// HTTP server.
pub struct PrometheusTelemetrySink {
    event_duration: HistogramVec,
    last_event_time: prometheus::GaugeVec,
}

impl PrometheusTelemetrySink {
    /// Register the telemetry metric families against `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetrySinkError`] if either metric family is already
    /// registered.
    pub fn new(registry: &Registry) -> Result<Self, TelemetrySinkError> {
        let event_duration = HistogramVec::new(
            prometheus::HistogramOpts::new("event_duration_seconds", "Duration of events"),
            &["event_name"],
        )
        .map_err(|error| TelemetrySinkError::registration(error.to_string()))?;
        let last_event_time = prometheus::GaugeVec::new(
            prometheus::Opts::new("event_last_time", "Timestamp of last event occurrence"),
            &["event_name"],
        )
        .map_err(|error| TelemetrySinkError::registration(error.to_string()))?;

        registry
            .register(Box::new(event_duration.clone()))
            .map_err(|error| TelemetrySinkError::registration(error.to_string()))?;
        registry
            .register(Box::new(last_event_time.clone()))
            .map_err(|error| TelemetrySinkError::registration(error.to_string()))?;

        Ok(Self {
            event_duration,
            last_event_time,
        })
    }
}

#[async_trait]
impl TelemetrySink for PrometheusTelemetrySink {
    async fn record_event(&self, event: &TelemetryEvent) {
        self.event_duration
            .with_label_values(&[event.event_name.as_str()])
            .observe(event.duration_seconds());
        self.last_event_time
            .with_label_values(&[event.event_name.as_str()])
            .set(event.end_time);
    }
}
