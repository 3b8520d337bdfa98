//! Scripted in-memory provider and request helpers shared by router tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{Map, Value};
use tower::ServiceExt;

use tickergate_core::error::{GatewayError, Result};
use tickergate_core::market::{
    Bar, Dividend, EarningsFrequency, EarningsRow, Interval, OptionsChain, Period, Symbol,
};
use tickergate_gateway::{app_state::AppState, config::GatewayConfig, router, upstream::MarketDataProvider};

#[derive(Default)]
pub struct ScriptedProvider {
    pub bars: HashMap<String, Vec<Bar>>,
    pub failing: HashSet<String>,
    pub panicking: HashSet<String>,
    pub profiles: HashMap<String, Map<String, Value>>,
    pub dividends: HashMap<String, Vec<Dividend>>,
    pub earnings: HashMap<(String, EarningsFrequency), Vec<EarningsRow>>,
    pub expirations: HashMap<String, Vec<String>>,
    pub chains: HashMap<(String, String), (Vec<Value>, Vec<Value>)>,
    pub history_calls: Mutex<Vec<(String, Period, Interval)>>,
}

impl ScriptedProvider {
    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.into(), bars);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.into());
        self
    }

    pub fn panicking(mut self, symbol: &str) -> Self {
        self.panicking.insert(symbol.into());
        self
    }

    fn check(&self, symbol: &Symbol) -> Result<()> {
        if self.panicking.contains(symbol.as_str()) {
            panic!("scripted panic for {symbol}");
        }
        if self.failing.contains(symbol.as_str()) {
            return Err(GatewayError::Upstream(format!("connection reset fetching {symbol}")));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn history(&self, symbol: &Symbol, period: Period, interval: Interval) -> Result<Vec<Bar>> {
        self.history_calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), period, interval));
        self.check(symbol)?;
        Ok(self.bars.get(symbol.as_str()).cloned().unwrap_or_default())
    }

    async fn profile(&self, symbol: &Symbol) -> Result<Map<String, Value>> {
        self.check(symbol)?;
        Ok(self.profiles.get(symbol.as_str()).cloned().unwrap_or_default())
    }

    async fn dividends(&self, symbol: &Symbol) -> Result<Vec<Dividend>> {
        self.check(symbol)?;
        Ok(self.dividends.get(symbol.as_str()).cloned().unwrap_or_default())
    }

    async fn earnings(&self, symbol: &Symbol, frequency: EarningsFrequency) -> Result<Vec<EarningsRow>> {
        self.check(symbol)?;
        Ok(self
            .earnings
            .get(&(symbol.to_string(), frequency))
            .cloned()
            .unwrap_or_default())
    }

    async fn option_expirations(&self, symbol: &Symbol) -> Result<Vec<String>> {
        self.check(symbol)?;
        Ok(self.expirations.get(symbol.as_str()).cloned().unwrap_or_default())
    }

    async fn option_chain(&self, symbol: &Symbol, expiration: &str) -> Result<OptionsChain> {
        self.check(symbol)?;
        let (calls, puts) = self
            .chains
            .get(&(symbol.to_string(), expiration.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(OptionsChain {
            symbol: symbol.clone(),
            expiration: expiration.to_string(),
            calls,
            puts,
        })
    }
}

/// Bar on 2024-03-`day` at the US open.
pub fn bar(day: u32, close: f64, volume: u64) -> Bar {
    let ts = Utc.with_ymd_and_hms(2024, 3, day, 14, 30, 0).unwrap();
    Bar::new(ts, close - 1.0, close + 1.0, close - 2.0, close, volume).unwrap()
}

pub fn app(provider: ScriptedProvider) -> (Router, AppState, Arc<ScriptedProvider>) {
    let provider = Arc::new(provider);
    let state = AppState::new(GatewayConfig::default(), provider.clone());
    (router::build_router(state.clone()), state, provider)
}

pub async fn get_raw(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let ctype = resp
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, ctype, String::from_utf8(body.to_vec()).unwrap())
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get_raw(app, uri).await;
    (status, serde_json::from_str(&body).expect("json body"))
}
