//! Observability: metrics registry, request instrumentation, upstream timing.
//!
//! Metrics are stored as atomics and rendered by the `/metrics` handler.

pub mod metrics;
pub mod middleware;
pub mod timer;

pub use metrics::GatewayMetrics;
pub use timer::UpstreamTimer;
