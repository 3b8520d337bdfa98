//! Yahoo Finance adapter.
//!
//! Endpoints used:
//! - `/v8/finance/chart/{symbol}`: bars and dividend events (no crumb)
//! - `/v10/finance/quoteSummary/{symbol}`: profile and earnings (crumb)
//! - `/v7/finance/options/{symbol}`: expirations and chains (crumb)
//!
//! The crumb is fetched lazily and kept in memory. A 401 drops it so the next
//! request fetches a fresh one; the failing request itself is not retried.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use tickergate_core::error::{GatewayError, Result};
use tickergate_core::market::{
    Bar, Dividend, EarningsFrequency, EarningsRow, Interval, OptionsChain, Period, Symbol,
};

use crate::config::UpstreamSection;
use crate::upstream::MarketDataProvider;

const PROFILE_MODULES: [&str; 3] = ["assetProfile", "price", "summaryDetail"];

pub struct YahooProvider {
    http: reqwest::Client,
    base_url: String,
    session_url: String,
    crumb: RwLock<Option<String>>,
}

impl YahooProvider {
    pub fn new(cfg: &UpstreamSection) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .cookie_store(true)
            .build()
            .map_err(|e| GatewayError::Config(format!("build http client failed: {e}")))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            session_url: cfg.session_url.clone(),
            crumb: RwLock::new(None),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            self.crumb.write().await.take();
        }
        let body = resp.bytes().await.map_err(transport_error)?;
        decode(status, &body)
    }

    async fn crumb(&self) -> Result<String> {
        if let Some(c) = self.crumb.read().await.as_ref() {
            return Ok(c.clone());
        }

        // session cookie lands in the client's jar; the response itself is irrelevant
        if let Err(e) = self.http.get(&self.session_url).send().await {
            tracing::debug!(error = %e, "session cookie request failed");
        }

        let resp = self
            .http
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;
        let crumb = validate_crumb(status, &body)?;

        *self.crumb.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    async fn quote_summary(&self, symbol: &Symbol, modules: &[&str]) -> Result<Map<String, Value>> {
        let path = format!("/v10/finance/quoteSummary/{}", path_segment(symbol)?);
        let crumb = self.crumb().await?;
        let env: QuoteSummaryEnvelope = self
            .fetch(&path, &[("modules", modules.join(",")), ("crumb", crumb)])
            .await?;
        env.quote_summary.into_first()
    }

    async fn options(&self, symbol: &Symbol, date: Option<i64>) -> Result<Option<OptionResult>> {
        let path = format!("/v7/finance/options/{}", path_segment(symbol)?);
        let crumb = self.crumb().await?;
        let mut query = vec![("crumb", crumb)];
        if let Some(ts) = date {
            query.push(("date", ts.to_string()));
        }
        let env: OptionEnvelope = self.fetch(&path, &query).await?;
        env.option_chain.into_optional()
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn history(&self, symbol: &Symbol, period: Period, interval: Interval) -> Result<Vec<Bar>> {
        let env: ChartEnvelope = self
            .fetch(
                &format!("/v8/finance/chart/{}", path_segment(symbol)?),
                &[
                    ("range", period.as_str().to_string()),
                    ("interval", interval.as_str().to_string()),
                ],
            )
            .await?;
        parse_bars(env)
    }

    async fn profile(&self, symbol: &Symbol) -> Result<Map<String, Value>> {
        let result = self.quote_summary(symbol, &PROFILE_MODULES).await?;
        Ok(flatten_profile(&result))
    }

    async fn dividends(&self, symbol: &Symbol) -> Result<Vec<Dividend>> {
        let env: ChartEnvelope = self
            .fetch(
                &format!("/v8/finance/chart/{}", path_segment(symbol)?),
                &[
                    ("range", Period::Max.as_str().to_string()),
                    ("interval", Interval::OneDay.as_str().to_string()),
                    ("events", "div".to_string()),
                ],
            )
            .await?;
        parse_dividends(env)
    }

    async fn earnings(&self, symbol: &Symbol, frequency: EarningsFrequency) -> Result<Vec<EarningsRow>> {
        let result = self.quote_summary(symbol, &["earnings"]).await?;
        parse_earnings(&result, frequency)
    }

    async fn option_expirations(&self, symbol: &Symbol) -> Result<Vec<String>> {
        let Some(result) = self.options(symbol, None).await? else {
            return Ok(Vec::new());
        };
        Ok(result
            .expiration_dates
            .iter()
            .filter_map(|&ts| unix_to_date(ts))
            .collect())
    }

    async fn option_chain(&self, symbol: &Symbol, expiration: &str) -> Result<OptionsChain> {
        let ts = date_to_unix(expiration)?;
        let result = self.options(symbol, Some(ts)).await?;
        Ok(parse_chain(symbol, expiration, result))
    }
}

/// Percent-encode a ticker as exactly one path segment, so `?`, `#` and `/`
/// stay part of the symbol. Dot-only tickers would be collapsed by URL
/// normalisation and are refused.
fn path_segment(symbol: &Symbol) -> Result<Cow<'_, str>> {
    let raw = symbol.as_str();
    if raw.chars().all(|c| c == '.') {
        return Err(GatewayError::BadRequest(format!("Invalid ticker: {raw}")));
    }
    Ok(urlencoding::encode(raw))
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Upstream(format!("upstream request timed out: {e}"))
    } else if e.is_connect() {
        GatewayError::Upstream(format!("upstream connection failed: {e}"))
    } else {
        GatewayError::Upstream(format!("upstream request failed: {e}"))
    }
}

/// Decode a provider body. Yahoo puts structured errors in non-2xx bodies,
/// so the body is tried first and the status only explains undecodable ones.
fn decode<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        if status.is_success() {
            GatewayError::Upstream(format!("unexpected upstream payload: {e}"))
        } else {
            GatewayError::Upstream(format!("upstream returned status {}", status.as_u16()))
        }
    })
}

fn validate_crumb(status: StatusCode, body: &str) -> Result<String> {
    let crumb = body.trim();
    if status == StatusCode::TOO_MANY_REQUESTS || crumb.to_lowercase().contains("too many requests") {
        return Err(GatewayError::Upstream("upstream rate limited while fetching crumb".into()));
    }
    if !status.is_success()
        || crumb.is_empty()
        || crumb.len() >= 100
        || crumb.contains(char::is_whitespace)
        || crumb.contains('<')
    {
        return Err(GatewayError::Upstream(format!(
            "failed to obtain upstream crumb (status {})",
            status.as_u16()
        )));
    }
    Ok(crumb.to_string())
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| GatewayError::Upstream(format!("invalid upstream timestamp {ts}")))
}

fn unix_to_date(ts: i64) -> Option<String> {
    DateTime::from_timestamp(ts, 0).map(|d| d.date_naive().format("%Y-%m-%d").to_string())
}

fn date_to_unix(date: &str) -> Result<i64> {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| GatewayError::BadRequest(format!("invalid date {date}: {e}")))?;
    Ok(d.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default())
}

/// `{raw, fmt}` wrappers collapse to `raw`; empty objects (Yahoo's "no
/// value") are dropped.
fn unwrap_raw(v: &Value) -> Option<Value> {
    match v {
        Value::Object(o) if o.is_empty() => None,
        Value::Object(o) if o.contains_key("raw") => o.get("raw").cloned(),
        Value::Null => None,
        other => Some(other.clone()),
    }
}

// --------------------
// Wire types
// --------------------

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl ApiError {
    fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("not found")
    }

    fn into_error(self) -> GatewayError {
        GatewayError::Upstream(format!("{}: {}", self.code, self.description))
    }
}

/// `{result: [...], error: {...}}`, shared by every Yahoo endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ResultBody<T> {
    #[serde(default)]
    result: Option<Vec<T>>,
    #[serde(default)]
    error: Option<ApiError>,
}

impl<T> ResultBody<T> {
    /// First result; `None` for "Not Found" and empty results.
    fn into_optional(self) -> Result<Option<T>> {
        if let Some(err) = self.error {
            if err.is_not_found() {
                return Ok(None);
            }
            return Err(err.into_error());
        }
        Ok(self.result.and_then(|r| r.into_iter().next()))
    }

    /// First result; absence is a provider failure.
    fn into_first(self) -> Result<T> {
        if let Some(err) = self.error {
            return Err(err.into_error());
        }
        self.result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| GatewayError::Upstream("upstream returned no result".into()))
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ResultBody<ChartResult>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
    #[serde(default)]
    events: ChartEvents,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: BTreeMap<String, DividendEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: ResultBody<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct OptionEnvelope {
    #[serde(rename = "optionChain")]
    option_chain: ResultBody<OptionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionSides>,
}

#[derive(Debug, Deserialize)]
struct OptionSides {
    #[serde(default)]
    calls: Vec<Value>,
    #[serde(default)]
    puts: Vec<Value>,
}

// --------------------
// Reshaping
// --------------------

/// Rows missing any OHLC value are dropped; a missing volume counts as 0.
fn parse_bars(env: ChartEnvelope) -> Result<Vec<Bar>> {
    let Some(result) = env.chart.into_optional()? else {
        return Ok(Vec::new());
    };
    let Some(q) = result.indicators.quote.first() else {
        return Ok(Vec::new());
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) =
            (at(&q.open, i), at(&q.high, i), at(&q.low, i), at(&q.close, i))
        else {
            continue;
        };
        let volume = q.volume.get(i).copied().flatten().unwrap_or(0);
        if let Ok(bar) = Bar::new(unix_to_utc(ts)?, open, high, low, close, volume) {
            bars.push(bar);
        }
    }
    Ok(bars)
}

fn at(col: &[Option<f64>], i: usize) -> Option<f64> {
    col.get(i).copied().flatten()
}

fn parse_dividends(env: ChartEnvelope) -> Result<Vec<Dividend>> {
    let Some(result) = env.chart.into_optional()? else {
        return Ok(Vec::new());
    };
    result
        .events
        .dividends
        .into_values()
        .map(|d| {
            Ok(Dividend {
                ex_date: unix_to_utc(d.date)?,
                amount: d.amount,
            })
        })
        .collect()
}

/// Merge the profile modules into one flat map. Earlier modules win on
/// duplicate keys.
fn flatten_profile(result: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for module in PROFILE_MODULES {
        let Some(Value::Object(fields)) = result.get(module) else { continue };
        for (k, v) in fields {
            if let Some(v) = unwrap_raw(v) {
                out.entry(k.clone()).or_insert(v);
            }
        }
    }
    out
}

fn parse_earnings(result: &Map<String, Value>, frequency: EarningsFrequency) -> Result<Vec<EarningsRow>> {
    let rows = result
        .get("earnings")
        .and_then(|e| e.get("financialsChart"))
        .and_then(|c| c.get(frequency.as_str()))
        .and_then(Value::as_array);
    let Some(rows) = rows else {
        return Ok(Vec::new());
    };

    Ok(rows
        .iter()
        .filter_map(|row| {
            let period = match row.get("date")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let metric = |k: &str| row.get(k).and_then(unwrap_raw).and_then(|v| v.as_f64());
            Some(EarningsRow {
                period,
                revenue: metric("revenue"),
                earnings: metric("earnings"),
            })
        })
        .collect())
}

fn parse_chain(symbol: &Symbol, expiration: &str, result: Option<OptionResult>) -> OptionsChain {
    let sides = result.and_then(|r| r.options.into_iter().next());
    let (calls, puts) = sides.map(|s| (s.calls, s.puts)).unwrap_or_default();
    OptionsChain {
        symbol: symbol.clone(),
        expiration: expiration.to_string(),
        calls,
        puts,
    }
}
