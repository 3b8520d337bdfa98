//! tickergate gateway library entry.
//!
//! This crate wires config, the upstream provider, the metrics registry and
//! instrumentation, and the market data routes into one axum application. It
//! is consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod extract;
pub mod obs;
pub mod ops;
pub mod router;
pub mod routes;
pub mod upstream;
