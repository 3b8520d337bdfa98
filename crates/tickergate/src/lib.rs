//! tickergate: an HTTP gateway for stock market data with Prometheus metrics.
//!
//! Depend on this crate alone to embed the gateway: build an [`AppState`]
//! around any [`MarketDataProvider`] and hand it to [`build_router`].

pub use tickergate_core as core;
pub use tickergate_gateway as gateway;

pub use tickergate_core::market::{Interval, Period, Symbol};
pub use tickergate_core::{ErrorKind, GatewayError};
pub use tickergate_gateway::app_state::AppState;
pub use tickergate_gateway::config::GatewayConfig;
pub use tickergate_gateway::router::build_router;
pub use tickergate_gateway::upstream::{MarketDataProvider, YahooProvider};

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn facade_builds_default_app() {
        let state = AppState::from_config(GatewayConfig::default()).unwrap();
        assert_eq!(state.provider().name(), "yahoo");
        let _router = build_router(state);
    }
}
