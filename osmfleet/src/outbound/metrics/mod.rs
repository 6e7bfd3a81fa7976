//! Outbound adapters for Prometheus-backed telemetry (C1).

mod http_server;
mod prometheus_telemetry;

pub use http_server::serve;
pub use prometheus_telemetry::PrometheusTelemetrySink;
