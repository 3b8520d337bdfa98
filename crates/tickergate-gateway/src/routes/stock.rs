//! Single-ticker endpoints: price, historical, info, dividends, earnings.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use tickergate_core::error::GatewayError;
use tickergate_core::market::series::format_timestamp;
use tickergate_core::market::{
    CompanyProfile, DividendHistory, EarningsFrequency, EarningsReport, HistoricalSeries,
    Interval, Period, Quote, Symbol,
};

use crate::app_state::AppState;
use crate::error::ApiResult;
use crate::extract::{QueryParams, Ticker};
use crate::routes::warn_upstream;

const NO_DIVIDENDS: &str = "No dividend data available";
const NO_EARNINGS: &str = "No earnings data available";

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub interval: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EarningsQuery {
    pub frequency: Option<String>,
}

fn track(app: &AppState, ticker: &str) -> Result<Symbol, GatewayError> {
    let symbol = Symbol::parse(ticker)?;
    app.metrics().inc_symbol_request(symbol.as_str());
    Ok(symbol)
}

/// Latest close and volume from the 1-day window.
pub async fn price(State(app): State<AppState>, Ticker(ticker): Ticker) -> ApiResult<Value> {
    let symbol = track(&app, &ticker)?;

    let bars = {
        let _timer = app.metrics().upstream_timer("get_price");
        app.provider()
            .history(&symbol, Period::OneDay, Interval::OneDay)
            .await
    }
    .inspect_err(|e| warn_upstream("get_price", &symbol, e))?;

    let quote = Quote::from_last_bar(symbol, &bars).ok_or_else(|| {
        GatewayError::NotFound(format!("No data found for ticker {}", ticker.trim()))
    })?;

    Ok(Json(json!({
        "ticker": quote.symbol,
        "current_price": quote.price,
        "volume": quote.volume,
        "timestamp": format_timestamp(&quote.timestamp),
    })))
}

pub async fn historical(
    State(app): State<AppState>,
    Ticker(ticker): Ticker,
    QueryParams(q): QueryParams<HistoryQuery>,
) -> ApiResult<Value> {
    let symbol = track(&app, &ticker)?;
    let interval = match q.interval.as_deref() {
        Some(s) => s.parse::<Interval>()?,
        None => Interval::default(),
    };
    let period = match q.period.as_deref() {
        Some(s) => s.parse::<Period>()?,
        None => Period::default(),
    };

    let bars = {
        let _timer = app.metrics().upstream_timer("get_historical");
        app.provider().history(&symbol, period, interval).await
    }
    .inspect_err(|e| warn_upstream("get_historical", &symbol, e))?;

    if bars.is_empty() {
        return Err(GatewayError::NotFound(format!(
            "No historical data found for ticker {symbol}"
        ))
        .into());
    }

    let series = HistoricalSeries { symbol, interval, period, bars };
    let history = series.to_history_map()?;
    Ok(Json(json!({
        "ticker": series.symbol,
        "interval": series.interval,
        "period": series.period,
        "data_points": series.len(),
        "history": history,
    })))
}

pub async fn info(State(app): State<AppState>, Ticker(ticker): Ticker) -> ApiResult<Value> {
    let symbol = track(&app, &ticker)?;

    let fields = {
        let _timer = app.metrics().upstream_timer("get_info");
        app.provider().profile(&symbol).await
    }
    .inspect_err(|e| warn_upstream("get_info", &symbol, e))?;

    Ok(Json(json!({
        "ticker": symbol,
        "company_info": CompanyProfile::from_fields(&fields),
    })))
}

pub async fn dividends(State(app): State<AppState>, Ticker(ticker): Ticker) -> ApiResult<Value> {
    let symbol = track(&app, &ticker)?;

    let entries = {
        let _timer = app.metrics().upstream_timer("get_dividends");
        app.provider().dividends(&symbol).await
    }
    .inspect_err(|e| warn_upstream("get_dividends", &symbol, e))?;

    let history = DividendHistory::new(entries);
    let dividend_history = if history.is_empty() {
        Value::from(NO_DIVIDENDS)
    } else {
        Value::Object(history.to_map())
    };

    Ok(Json(json!({
        "ticker": symbol,
        "dividend_history": dividend_history,
    })))
}

pub async fn earnings(
    State(app): State<AppState>,
    Ticker(ticker): Ticker,
    QueryParams(q): QueryParams<EarningsQuery>,
) -> ApiResult<Value> {
    let symbol = track(&app, &ticker)?;
    let frequency = match q.frequency.as_deref() {
        Some(s) => s.parse::<EarningsFrequency>()?,
        None => EarningsFrequency::default(),
    };

    let rows = {
        let _timer = app.metrics().upstream_timer("get_earnings");
        app.provider().earnings(&symbol, frequency).await
    }
    .inspect_err(|e| warn_upstream("get_earnings", &symbol, e))?;

    let report = EarningsReport::new(symbol, frequency, rows);
    let earnings_data = if report.is_empty() {
        Value::from(NO_EARNINGS)
    } else {
        Value::Object(report.to_map())
    };

    Ok(Json(json!({
        "ticker": report.symbol,
        "frequency": report.frequency,
        "earnings_data": earnings_data,
    })))
}
