//! Axum router wiring.
//!
//! Route templates double as the `endpoint` metrics label.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, obs, ops, routes};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .route("/stock/:ticker/price", get(routes::stock::price))
        .route("/stock/:ticker/historical", get(routes::stock::historical))
        .route("/stock/:ticker/info", get(routes::stock::info))
        .route("/stock/:ticker/dividends", get(routes::stock::dividends))
        .route("/stock/:ticker/earnings", get(routes::stock::earnings))
        .route("/stock/:ticker/options", get(routes::options::options_chain))
        .route("/stocks/batch", get(routes::batch::batch_prices))
        // `layer` (not `route_layer`) so unmatched requests are counted too
        .layer(middleware::from_fn_with_state(
            state.clone(),
            obs::middleware::track_requests,
        ))
        .with_state(state)
}
