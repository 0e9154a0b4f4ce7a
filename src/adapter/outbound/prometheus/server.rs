//! `GET /metrics` over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::exporter::PrometheusExporter;

/// A running exposition endpoint.
#[derive(Debug)]
pub struct ExporterHandle {
    /// Address actually bound; differs from the request when port 0 was asked.
    pub addr: SocketAddr,
    pub task: JoinHandle<()>,
}

impl ExporterHandle {
    pub fn abort(&self) {
        self.task.abort();
    }
}

async fn metrics(State(exporter): State<Arc<PrometheusExporter>>) -> impl IntoResponse {
    ([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], exporter.render())
}

/// Serve `exporter` on `addr`. A bind failure is logged and yields `None`;
/// the rest of the process keeps running without exposition.
pub async fn serve(exporter: Arc<PrometheusExporter>, addr: SocketAddr) -> Option<ExporterHandle> {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!(%addr, error = %e, "Metrics exporter failed to bind, continuing without it");
            return None;
        }
    };
    let bound = listener.local_addr().unwrap_or(addr);

    let app = Router::new()
        .route("/metrics", get(metrics))
        .with_state(exporter);

    info!(addr = %bound, "Metrics exporter listening");
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Metrics exporter stopped");
        }
    });

    Some(ExporterHandle { addr: bound, task })
}
