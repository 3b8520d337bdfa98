//! Market data route handlers.
//!
//! Every handler parses its parameters, counts the symbol, makes its upstream
//! call under an `UpstreamTimer`, and reshapes the answer. Failures leave as
//! `ApiError`; nothing is retried.

pub mod batch;
pub mod options;
pub mod stock;

use tickergate_core::error::GatewayError;
use tickergate_core::market::Symbol;

fn warn_upstream(operation: &'static str, symbol: &Symbol, err: &GatewayError) {
    tracing::warn!(ticker = %symbol, operation, error = %err, "upstream call failed");
}
