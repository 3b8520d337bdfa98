//! Time series records: OHLCV bars, quotes, historical series, dividends.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};
use crate::market::{Interval, Period, Symbol};

/// Render a timestamp the way every response in the gateway does.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bar {
    #[serde(skip)]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
}

impl Bar {
    /// Build a bar; every price must be finite.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self> {
        for (name, v) in [("open", open), ("high", high), ("low", low), ("close", close)] {
            if !v.is_finite() {
                return Err(GatewayError::Upstream(format!("non-finite {name} in bar")));
            }
        }
        Ok(Self { timestamp, open, high, low, close, volume })
    }
}

/// Latest price and volume for a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: Symbol,
    pub price: f64,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Take the last bar of a window. `None` when the window is empty.
    pub fn from_last_bar(symbol: Symbol, bars: &[Bar]) -> Option<Self> {
        let last = bars.last()?;
        Some(Self {
            symbol,
            price: last.close,
            volume: last.volume,
            timestamp: last.timestamp,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSeries {
    pub symbol: Symbol,
    pub interval: Interval,
    pub period: Period,
    /// Chronological, as delivered upstream.
    pub bars: Vec<Bar>,
}

impl HistoricalSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// `{timestamp -> {Open, High, Low, Close, Volume}}`.
    ///
    /// Keys keep the bars' chronological order.
    pub fn to_history_map(&self) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        for bar in &self.bars {
            let row = serde_json::to_value(bar)
                .map_err(|e| GatewayError::Internal(format!("encode bar failed: {e}")))?;
            out.insert(format_timestamp(&bar.timestamp), row);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dividend {
    pub ex_date: DateTime<Utc>,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DividendHistory {
    pub entries: Vec<Dividend>,
}

impl DividendHistory {
    /// Sorts by ex-dividend date and drops non-finite payouts.
    pub fn new(mut entries: Vec<Dividend>) -> Self {
        entries.retain(|d| d.amount.is_finite());
        entries.sort_by_key(|d| d.ex_date);
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `{ex_date -> amount}`.
    pub fn to_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|d| (format_timestamp(&d.ex_date), Value::from(d.amount)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 14, 30, 0).unwrap()
    }

    #[test]
    fn bar_rejects_nan_close() {
        let err = Bar::new(ts(1), 1.0, 2.0, 0.5, f64::NAN, 10).unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn quote_uses_last_bar() {
        let bars = vec![
            Bar::new(ts(1), 1.0, 2.0, 0.5, 1.5, 100).unwrap(),
            Bar::new(ts(2), 1.5, 2.5, 1.0, 2.25, 250).unwrap(),
        ];
        let q = Quote::from_last_bar(Symbol::parse("AAPL").unwrap(), &bars).unwrap();
        assert_eq!(q.price, 2.25);
        assert_eq!(q.volume, 250);
        assert_eq!(q.timestamp, ts(2));
    }

    #[test]
    fn history_map_keys_are_chronological() {
        let series = HistoricalSeries {
            symbol: Symbol::parse("MSFT").unwrap(),
            interval: Interval::OneDay,
            period: Period::OneMonth,
            bars: vec![
                Bar::new(ts(9), 1.0, 1.0, 1.0, 1.0, 1).unwrap(),
                Bar::new(ts(10), 2.0, 2.0, 2.0, 2.0, 2).unwrap(),
            ],
        };
        let map = series.to_history_map().unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["2024-03-09T14:30:00Z", "2024-03-10T14:30:00Z"]);
        assert_eq!(map["2024-03-10T14:30:00Z"]["Close"], 2.0);
        assert_eq!(map["2024-03-10T14:30:00Z"]["Volume"], 2);
    }

    #[test]
    fn dividends_sorted_and_finite() {
        let h = DividendHistory::new(vec![
            Dividend { ex_date: ts(20), amount: 0.25 },
            Dividend { ex_date: ts(5), amount: f64::INFINITY },
            Dividend { ex_date: ts(2), amount: 0.24 },
        ]);
        assert_eq!(h.entries.len(), 2);
        assert_eq!(h.entries[0].ex_date, ts(2));
    }
}
