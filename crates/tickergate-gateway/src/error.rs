//! HTTP rendering of `GatewayError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use tickergate_core::error::GatewayError;

/// Handler-boundary error. Renders as `{"detail": "..."}` and tags the
/// response with its `ErrorKind` so the instrumentation layer can count it.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status =
            StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut resp = (status, Json(json!({ "detail": self.0.to_string() }))).into_response();
        resp.extensions_mut().insert(kind);
        resp
    }
}

/// Handler result.
pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;
