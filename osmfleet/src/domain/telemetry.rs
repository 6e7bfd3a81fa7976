//! Telemetry Sink (C1): observes event durations and last-seen timestamps.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use crate::domain::model::TelemetryEvent;
use crate::domain::ports::TelemetrySink;

/// Times an operation and records it through a [`TelemetrySink`].
///
/// When telemetry is disabled the configured sink is [`NullTelemetrySink`],
/// so every call here becomes a no-op, matching §4.8.
///
/// [`NullTelemetrySink`]: crate::domain::ports::NullTelemetrySink
pub struct TelemetryRecorder {
    sink: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
}

impl TelemetryRecorder {
    /// Build a recorder over the given sink, using the system clock.
    #[must_use]
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self::with_clock(sink, Arc::new(DefaultClock))
    }

    /// Build a recorder with an injectable clock, for deterministic tests.
    #[must_use]
    pub fn with_clock(sink: Arc<dyn TelemetrySink>, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }

    /// Run `operation`, recording its wall-clock duration under
    /// `event_name`. The operation's own `Result` is returned unchanged;
    /// telemetry failures never affect the caller.
    pub async fn time<F, Fut, T>(&self, event_name: &str, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        #[expect(
            clippy::cast_precision_loss,
            reason = "unix timestamps fit in f64 with ample headroom"
        )]
        let start = self.clock.utc().timestamp() as f64;
        let result = operation().await;
        #[expect(
            clippy::cast_precision_loss,
            reason = "unix timestamps fit in f64 with ample headroom"
        )]
        let end = self.clock.utc().timestamp() as f64;
        self.sink
            .record_event(&TelemetryEvent {
                event_name: event_name.to_owned(),
                start_time: start,
                end_time: end,
                extra_labels: Vec::new(),
            })
            .await;
        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, TimeZone, Utc};

    use super::*;
    use crate::domain::ports::MockTelemetrySink;

    /// Clock pinned to a fixed instant, for deterministic duration tests.
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[tokio::test]
    async fn records_one_event_per_timed_operation() {
        let mut sink = MockTelemetrySink::new();
        sink.expect_record_event()
            .times(1)
            .withf(|event| event.event_name == "fetch")
            .returning(|_| ());
        let now = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("valid time");
        let recorder =
            TelemetryRecorder::with_clock(Arc::new(sink), Arc::new(FixedClock(now)));

        let value = recorder.time("fetch", || async { 42 }).await;
        assert_eq!(value, 42);
    }
}
