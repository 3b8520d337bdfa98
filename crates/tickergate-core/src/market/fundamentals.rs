//! Company profile, earnings and options chain records.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::market::{EarningsFrequency, Symbol};

/// Company profile. Every field is optional; a missing or mistyped upstream
/// field becomes `null` rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub market_cap: Option<f64>,
    pub employees: Option<u64>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub summary: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
}

impl CompanyProfile {
    /// Pick the profile out of a flat provider field map.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |k: &str| fields.get(k).and_then(Value::as_str).map(str::to_string);
        Self {
            long_name: text("longName"),
            sector: text("sector"),
            industry: text("industry"),
            website: text("website"),
            market_cap: fields
                .get("marketCap")
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite()),
            employees: fields.get("fullTimeEmployees").and_then(Value::as_u64),
            country: text("country"),
            city: text("city"),
            summary: text("longBusinessSummary"),
            currency: text("currency"),
            exchange: text("exchange"),
        }
    }
}

/// One earnings period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsRow {
    /// Provider period label, e.g. `2023` or `3Q2024`.
    pub period: String,
    pub revenue: Option<f64>,
    pub earnings: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarningsReport {
    pub symbol: Symbol,
    pub frequency: EarningsFrequency,
    pub rows: Vec<EarningsRow>,
}

impl EarningsReport {
    pub fn new(symbol: Symbol, frequency: EarningsFrequency, rows: Vec<EarningsRow>) -> Self {
        let rows = rows
            .into_iter()
            .map(|r| EarningsRow {
                revenue: r.revenue.filter(|v| v.is_finite()),
                earnings: r.earnings.filter(|v| v.is_finite()),
                ..r
            })
            .collect();
        Self { symbol, frequency, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `{period -> {period, revenue, earnings}}`, keys in the provider's row
    /// order (oldest first) rather than sorted: `"1Q2024"` sorts before
    /// `"2Q2023"` lexically.
    pub fn to_map(&self) -> Map<String, Value> {
        self.rows
            .iter()
            .map(|r| {
                let row = serde_json::json!({
                    "period": r.period,
                    "revenue": r.revenue,
                    "earnings": r.earnings,
                });
                (r.period.clone(), row)
            })
            .collect()
    }
}

/// Calls and puts for one expiration. Contracts are provider JSON objects,
/// passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsChain {
    pub symbol: Symbol,
    pub expiration: String,
    pub calls: Vec<Value>,
    pub puts: Vec<Value>,
}

impl OptionsChain {
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }
}
