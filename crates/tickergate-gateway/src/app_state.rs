//! Shared application state for the gateway.
//!
//! Holds the config, the process-wide metrics registry and the upstream
//! provider. Cloned into every handler; everything behind it is immutable or
//! atomic.

use std::sync::Arc;

use tickergate_core::error::Result;

use crate::config::GatewayConfig;
use crate::obs::GatewayMetrics;
use crate::upstream::{MarketDataProvider, YahooProvider};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    metrics: GatewayMetrics,
    provider: Arc<dyn MarketDataProvider>,
}

impl AppState {
    pub fn new(cfg: GatewayConfig, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics: GatewayMetrics::default(),
                provider,
            }),
        }
    }

    /// Build state with the Yahoo provider described by `cfg.upstream`.
    pub fn from_config(cfg: GatewayConfig) -> Result<Self> {
        let provider = YahooProvider::new(&cfg.upstream)?;
        Ok(Self::new(cfg, Arc::new(provider)))
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn provider(&self) -> &dyn MarketDataProvider {
        self.inner.provider.as_ref()
    }
}
