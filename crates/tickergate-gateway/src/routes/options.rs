//! Options chain endpoint.
//!
//! Without `date`: list expirations. With `date`: the chain for that
//! expiration, which must be one of the listed ones.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use tickergate_core::error::{GatewayError, Result};
use tickergate_core::market::Symbol;

use crate::app_state::AppState;
use crate::error::ApiResult;
use crate::extract::{QueryParams, Ticker};
use crate::routes::warn_upstream;

#[derive(Debug, Deserialize)]
pub struct OptionsQuery {
    /// Expiration, `YYYY-MM-DD`.
    pub date: Option<String>,
}

pub async fn options_chain(
    State(app): State<AppState>,
    Ticker(ticker): Ticker,
    QueryParams(q): QueryParams<OptionsQuery>,
) -> ApiResult<Value> {
    match resolve(&app, &ticker, q.date.as_deref()).await {
        Ok(body) => Ok(Json(body)),
        Err(e @ GatewayError::NotFound(_)) => Err(e.into()),
        Err(e) => Err(e.with_context("Error fetching options data: ").into()),
    }
}

async fn resolve(app: &AppState, ticker: &str, date: Option<&str>) -> Result<Value> {
    let symbol = Symbol::parse(ticker)?;
    app.metrics().inc_symbol_request(symbol.as_str());

    let dates = {
        let _timer = app.metrics().upstream_timer("get_options_dates");
        app.provider().option_expirations(&symbol).await
    }
    .inspect_err(|e| warn_upstream("get_options_dates", &symbol, e))?;

    let Some(date) = date else {
        return Ok(json!({ "ticker": symbol, "options_dates": dates }));
    };

    if !dates.iter().any(|d| d == date) {
        return Err(GatewayError::NotFound(format!(
            "Expiration date {date} not found for {symbol}"
        )));
    }

    let chain = {
        let _timer = app.metrics().upstream_timer("get_option_chain");
        app.provider().option_chain(&symbol, date).await
    }
    .inspect_err(|e| warn_upstream("get_option_chain", &symbol, e))?;

    if chain.is_empty() {
        return Err(GatewayError::NotFound(format!(
            "No options data found for {symbol} on {date}"
        )));
    }

    Ok(json!({
        "ticker": chain.symbol,
        "expiration": chain.expiration,
        "calls": chain.calls,
        "puts": chain.puts,
    }))
}
