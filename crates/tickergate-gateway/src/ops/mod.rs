//! Operational HTTP endpoints.
//!
//! - `/`        : liveness with server time
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use tickergate_core::market::series::format_timestamp;

use crate::app_state::AppState;
use crate::obs::metrics::EXPOSITION_CONTENT_TYPE;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "online",
        "timestamp": format_timestamp(&Utc::now()),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        body,
    )
        .into_response()
}
