use crate::error::Result;
use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use hyper::Server;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sonarqube-exporter",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Current state of every gauge in the Prometheus text format
async fn render_metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], handle.render())
}

/// Scrapers may use any path; everything but `/health` renders the metrics.
pub fn create_server(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .fallback(render_metrics)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(handle)
}

/// Bind the listener on all interfaces and serve it in the background.
///
/// Binding happens before this returns, so a taken port is reported to the
/// caller; the returned address carries the real port when `port` is 0.
pub fn start_server(handle: PrometheusHandle, port: u16) -> Result<SocketAddr> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let server = Server::try_bind(&addr)?.serve(create_server(handle).into_make_service());
    let local_addr = server.local_addr();

    info!("Metrics endpoint listening on http://{}/metrics", local_addr);

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server stopped: {}", e);
        }
    });

    Ok(local_addr)
}
