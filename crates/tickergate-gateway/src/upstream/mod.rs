//! Upstream market data provider contract.
//!
//! One method per upstream operation, each performing exactly one provider
//! round trip. Implementations own no retry and no caching. An answer that is
//! well-formed but empty comes back as an empty collection; handlers decide
//! whether that means 404 or a sentinel.

pub mod yahoo;

use async_trait::async_trait;
use serde_json::{Map, Value};

use tickergate_core::error::Result;
use tickergate_core::market::{
    Bar, Dividend, EarningsFrequency, EarningsRow, Interval, OptionsChain, Period, Symbol,
};

pub use yahoo::YahooProvider;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// OHLCV bars for a window, chronological.
    async fn history(&self, symbol: &Symbol, period: Period, interval: Interval) -> Result<Vec<Bar>>;

    /// Flat map of provider-native profile fields.
    async fn profile(&self, symbol: &Symbol) -> Result<Map<String, Value>>;

    async fn dividends(&self, symbol: &Symbol) -> Result<Vec<Dividend>>;

    async fn earnings(&self, symbol: &Symbol, frequency: EarningsFrequency) -> Result<Vec<EarningsRow>>;

    /// Available option expirations as `YYYY-MM-DD`.
    async fn option_expirations(&self, symbol: &Symbol) -> Result<Vec<String>>;

    /// Chain for one expiration (`YYYY-MM-DD`).
    async fn option_chain(&self, symbol: &Symbol, expiration: &str) -> Result<OptionsChain>;
}
