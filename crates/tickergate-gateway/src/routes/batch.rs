//! Multi-ticker price lookup.
//!
//! Symbols are looked up concurrently and independently: a failing symbol
//! becomes an `{"error": ...}` entry and never fails the whole call.

use axum::{extract::State, Json};
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use tickergate_core::error::GatewayError;
use tickergate_core::market::{Interval, Period, Quote, Symbol};

use crate::app_state::AppState;
use crate::error::ApiResult;
use crate::extract::QueryParams;
use crate::routes::warn_upstream;

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    pub tickers: Option<String>,
}

pub async fn batch_prices(State(app): State<AppState>, QueryParams(q): QueryParams<BatchQuery>) -> ApiResult<Value> {
    let raw = q
        .tickers
        .ok_or_else(|| GatewayError::BadRequest("tickers query parameter is required".into()))?;
    let symbols = Symbol::parse_list(&raw)?;

    for s in &symbols {
        app.metrics().inc_symbol_request(s.as_str());
    }

    let entries = join_all(symbols.iter().map(|s| lookup(&app, s))).await;

    let results: Map<String, Value> = symbols
        .iter()
        .map(Symbol::to_string)
        .zip(entries)
        .collect();
    Ok(Json(Value::Object(results)))
}

async fn lookup(app: &AppState, symbol: &Symbol) -> Value {
    let bars = {
        let _timer = app.metrics().upstream_timer("get_batch_price");
        app.provider()
            .history(symbol, Period::OneDay, Interval::OneDay)
            .await
    };

    match bars {
        Ok(bars) => match Quote::from_last_bar(symbol.clone(), &bars) {
            Some(q) => json!({ "current_price": q.price, "volume": q.volume }),
            None => json!({ "error": "No data found" }),
        },
        Err(e) => {
            warn_upstream("get_batch_price", symbol, &e);
            json!({ "error": format!("Failed to fetch data: {e}") })
        }
    }
}
