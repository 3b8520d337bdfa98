//! Request instrumentation.
//!
//! Counts every request against its route template, observes latency for
//! successes and counts failures by kind. Responses pass through unchanged;
//! a panicking handler becomes a counted 500.

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;

use tickergate_core::{ErrorKind, GatewayError};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::obs::GatewayMetrics;

/// Endpoint label for requests that matched no route.
pub const UNMATCHED: &str = "unmatched";

pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    // template, never the interpolated path: label cardinality stays bounded
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED.to_owned());

    let metrics = state.metrics();
    let started = Instant::now();
    metrics.inc_request(&endpoint);
    let _in_flight = InFlight::enter(metrics);

    let response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(resp) => resp,
        Err(_) => {
            tracing::error!(endpoint = %endpoint, "handler panicked");
            ApiError(GatewayError::Internal("handler panicked".into())).into_response()
        }
    };
    let elapsed = started.elapsed();

    match failure_kind(&response) {
        None => metrics.observe_request_latency(&endpoint, elapsed),
        Some(kind) => metrics.inc_error(kind),
    }

    tracing::debug!(
        endpoint = %endpoint,
        status = response.status().as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        "request handled"
    );
    response
}

/// Kind tagged by `ApiError`, or derived from the status for responses built
/// elsewhere (extractor rejections, the default 404).
fn failure_kind(resp: &Response) -> Option<ErrorKind> {
    if let Some(kind) = resp.extensions().get::<ErrorKind>() {
        return Some(*kind);
    }
    let status = resp.status();
    if status.as_u16() == 404 {
        Some(ErrorKind::NotFound)
    } else if status.is_client_error() {
        Some(ErrorKind::BadRequest)
    } else if status.is_server_error() {
        Some(ErrorKind::Internal)
    } else {
        None
    }
}

struct InFlight<'a>(&'a GatewayMetrics);

impl<'a> InFlight<'a> {
    fn enter(metrics: &'a GatewayMetrics) -> Self {
        metrics.in_flight.inc(&[]);
        Self(metrics)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.dec(&[]);
    }
}
