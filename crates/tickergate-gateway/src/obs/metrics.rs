//! Metrics registry for the gateway.
//!
//! Counter/gauge/histogram types with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors, and series are sorted again at
//! render time so the exposition output is deterministic. Histograms accumulate
//! in integer microseconds and are rendered in seconds.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use tickergate_core::ErrorKind;

use crate::obs::timer::UpstreamTimer;

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

type LabelKey = Vec<(String, String)>;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

/// `{a="b"}`, or nothing when unlabelled.
fn braces(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", labels)
    }
}

fn micros_to_secs(micros: u64) -> f64 {
    micros as f64 / 1_000_000.0
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for a label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "counter");
        let mut rows: Vec<(LabelKey, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (key, val) in rows {
            let _ = writeln!(out, "{}{} {}", name, braces(&label_str(&key)), val);
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    /// Decrement by 1.
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    /// Add an arbitrary signed delta.
    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "gauge");
        let mut rows: Vec<(LabelKey, i64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (key, val) in rows {
            let _ = writeln!(out, "{}{} {}", name, braces(&label_str(&key)), val);
        }
    }
}

// Bucket bounds in microseconds, 5ms .. 10s.
const BUCKETS_MICROS: [u64; 14] = [
    5_000, 10_000, 25_000, 50_000, 75_000, 100_000, 250_000, 500_000, 750_000,
    1_000_000, 2_500_000, 5_000_000, 7_500_000, 10_000_000,
];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MICROS.len()],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        // cumulative: every bucket whose bound covers the value
        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of observations for a label set.
    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "histogram");
        let mut keys: Vec<LabelKey> = self.map.iter().map(|r| r.key().clone()).collect();
        keys.sort();

        for key in keys {
            let Some(hist) = self.map.get(&key) else { continue };
            let labels = label_str(&key);
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(
                    out,
                    "{}_bucket{{{}le=\"{}\"}} {}",
                    name,
                    prefix,
                    micros_to_secs(le),
                    count
                );
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = micros_to_secs(hist.sum.load(Ordering::Relaxed));
            let _ = writeln!(out, "{}_sum{} {}", name, braces(&labels), sum);
            let _ = writeln!(out, "{}_count{} {}", name, braces(&labels), count);
        }
    }
}

/// Process-wide registry. Built once at startup and shared through `AppState`.
#[derive(Default)]
pub struct GatewayMetrics {
    pub requests: CounterVec,
    pub request_latency: HistogramVec,
    pub upstream_duration: HistogramVec,
    pub symbol_requests: CounterVec,
    pub errors: CounterVec,
    pub in_flight: GaugeVec,
}

impl GatewayMetrics {
    pub fn inc_request(&self, endpoint: &str) {
        self.requests.inc(&[("endpoint", endpoint)]);
    }

    pub fn observe_request_latency(&self, endpoint: &str, elapsed: Duration) {
        self.request_latency.observe(&[("endpoint", endpoint)], elapsed);
    }

    pub fn observe_upstream_duration(&self, operation: &str, elapsed: Duration) {
        self.upstream_duration.observe(&[("operation", operation)], elapsed);
    }

    /// Start timing one upstream call; recorded when the guard drops.
    pub fn upstream_timer(&self, operation: &'static str) -> UpstreamTimer<'_> {
        UpstreamTimer::start(self, operation)
    }

    pub fn inc_symbol_request(&self, symbol: &str) {
        self.symbol_requests.inc(&[("symbol", symbol)]);
    }

    pub fn inc_error(&self, kind: ErrorKind) {
        self.errors.inc(&[("error_type", kind.as_str())]);
    }

    /// Render every metric in the Prometheus text format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.requests.render(
            "market_data_requests_total",
            "Total number of requests to the API, by endpoint.",
            &mut out,
        );
        self.request_latency.render(
            "request_latency_seconds",
            "Latency of API requests in seconds, by endpoint.",
            &mut out,
        );
        self.upstream_duration.render(
            "upstream_api_duration_seconds",
            "Duration of upstream provider calls in seconds, by operation.",
            &mut out,
        );
        self.symbol_requests.render(
            "stock_symbol_requests_total",
            "Total number of requests for stock symbols, by symbol.",
            &mut out,
        );
        self.errors.render(
            "market_data_errors_total",
            "Total number of failed requests, by error type.",
            &mut out,
        );
        self.in_flight.render(
            "market_data_requests_in_flight",
            "Requests currently being handled.",
            &mut out,
        );
        out
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn counter_labels_are_order_independent() {
        let c = CounterVec::default();
        c.inc(&[("a", "1"), ("b", "2")]);
        c.inc(&[("b", "2"), ("a", "1")]);
        assert_eq!(c.get(&[("a", "1"), ("b", "2")]), 2);
    }

    #[test]
    fn histogram_buckets_are_cumulative() {
        let m = GatewayMetrics::default();
        m.observe_request_latency("/", Duration::from_millis(3));
        m.observe_request_latency("/", Duration::from_millis(60));
        m.observe_request_latency("/", Duration::from_secs(30));

        let out = m.render();
        assert!(out.contains("request_latency_seconds_bucket{endpoint=\"/\",le=\"0.005\"} 1\n"));
        assert!(out.contains("request_latency_seconds_bucket{endpoint=\"/\",le=\"0.075\"} 2\n"));
        assert!(out.contains("request_latency_seconds_bucket{endpoint=\"/\",le=\"10\"} 2\n"));
        assert!(out.contains("request_latency_seconds_bucket{endpoint=\"/\",le=\"+Inf\"} 3\n"));
        assert!(out.contains("request_latency_seconds_count{endpoint=\"/\"} 3\n"));
        assert!(out.contains("request_latency_seconds_sum{endpoint=\"/\"} 30.063\n"));
    }

    #[test]
    fn render_has_help_and_type_for_every_family() {
        let out = GatewayMetrics::default().render();
        for name in [
            "market_data_requests_total",
            "request_latency_seconds",
            "upstream_api_duration_seconds",
            "stock_symbol_requests_total",
            "market_data_errors_total",
            "market_data_requests_in_flight",
        ] {
            assert!(out.contains(&format!("# HELP {name} ")), "{name}");
            assert!(out.contains(&format!("# TYPE {name} ")), "{name}");
        }
    }

    #[test]
    fn label_values_are_escaped() {
        let m = GatewayMetrics::default();
        m.inc_symbol_request("A\"B\\C");
        let out = m.render();
        assert!(out.contains(r#"stock_symbol_requests_total{symbol="A\"B\\C"} 1"#));
    }

    #[test]
    fn error_counter_uses_kind_label() {
        let m = GatewayMetrics::default();
        m.inc_error(ErrorKind::NotFound);
        m.inc_error(ErrorKind::NotFound);
        m.inc_error(ErrorKind::Upstream);
        assert_eq!(m.errors.get(&[("error_type", "not_found")]), 2);
        assert!(m.render().contains("market_data_errors_total{error_type=\"upstream\"} 1\n"));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let m = std::sync::Arc::new(GatewayMetrics::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = m.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        m.inc_request("/stock/:ticker/price");
                        m.observe_request_latency("/stock/:ticker/price", Duration::from_micros(10));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(m.requests.get(&[("endpoint", "/stock/:ticker/price")]), 8_000);
        assert_eq!(m.request_latency.count(&[("endpoint", "/stock/:ticker/price")]), 8_000);
    }
}
