//! Scoped timer for upstream calls.
//!
//! One guard wraps exactly one provider call. The duration is recorded when
//! the guard drops, so early returns, `?` and cancelled futures are all
//! observed.

use std::time::Instant;

use crate::obs::metrics::GatewayMetrics;

#[must_use = "the call is timed until this guard is dropped"]
pub struct UpstreamTimer<'a> {
    metrics: &'a GatewayMetrics,
    operation: &'static str,
    started: Instant,
}

impl<'a> UpstreamTimer<'a> {
    pub(crate) fn start(metrics: &'a GatewayMetrics, operation: &'static str) -> Self {
        Self {
            metrics,
            operation,
            started: Instant::now(),
        }
    }
}

impl Drop for UpstreamTimer<'_> {
    fn drop(&mut self) {
        self.metrics
            .observe_upstream_duration(self.operation, self.started.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(m: &GatewayMetrics, fail: bool) -> Result<(), &'static str> {
        let _t = m.upstream_timer("get_info");
        if fail {
            return Err("boom");
        }
        Ok(())
    }

    #[test]
    fn records_on_error_path() {
        let m = GatewayMetrics::default();
        assert!(call(&m, true).is_err());
        assert_eq!(m.upstream_duration.count(&[("operation", "get_info")]), 1);
    }

    #[test]
    fn records_once_per_guard() {
        let m = GatewayMetrics::default();
        {
            let _t = m.upstream_timer("get_price");
        }
        {
            let _t = m.upstream_timer("get_price");
        }
        assert_eq!(m.upstream_duration.count(&[("operation", "get_price")]), 2);
    }
}
