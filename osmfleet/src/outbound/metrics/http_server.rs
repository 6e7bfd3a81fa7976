//! Minimal axum server exposing the Prometheus text-format scrape endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::{info, warn};

/// Serves `GET /metrics` off the given [`Registry`] until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the listener cannot bind `addr`.
pub async fn serve(
    addr: SocketAddr,
    registry: Registry,
    shutdown: tokio::sync::watch::Receiver<bool>,
) -> std::io::Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(registry));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "telemetry server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown))
        .await
}

async fn wait_for_shutdown(mut shutdown: tokio::sync::watch::Receiver<bool>) {
    if *shutdown.borrow() {
        return;
    }
    if shutdown.changed().await.is_err() {
        warn!("telemetry shutdown signal sender dropped; stopping server");
    }
}

async fn metrics_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let families = registry.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(error) = encoder.encode(&families, &mut buffer) {
        warn!(%error, "failed to encode prometheus metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    match String::from_utf8(buffer) {
        Ok(body) => (StatusCode::OK, body),
        Err(error) => {
            warn!(%error, "prometheus output was not valid utf-8");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn metrics_endpoint_reports_registered_families() {
        let registry = Registry::new();
        let counter = prometheus::Counter::new("test_total", "test counter").unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc();

        let response = metrics_handler(State(Arc::new(registry))).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
