//! Health and Prometheus metrics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use invoice::InvoiceStorage;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use store::Store;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health: ok when the store can open a unit of work.
pub async fn health<S, F>(State(state): State<Arc<AppState<S, F>>>) -> impl IntoResponse
where
    S: Store + Clone + 'static,
    F: InvoiceStorage + 'static,
{
    match state.store.begin().await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}

/// GET /metrics: Prometheus text exposition.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
