//! Prometheus metrics for the sync monitor

use lazy_static::lazy_static;
use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

lazy_static! {
    pub static ref PROBES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("gethmon_probes_total", "Total number of liveness probes served"),
        &["result"] // starting | ok | failure
    )
    .unwrap();

    pub static ref PROBE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "gethmon_probe_duration_seconds",
            "Probe evaluation duration in seconds"
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0])
    )
    .unwrap();

    pub static ref LOCAL_HEIGHT: Gauge = Gauge::new(
        "gethmon_local_block_height",
        "Last observed block height of the local node"
    )
    .unwrap();

    pub static ref REFERENCE_HEIGHT: Gauge = Gauge::new(
        "gethmon_reference_block_height",
        "Last observed block height of the reference API"
    )
    .unwrap();

    pub static ref SYNC_DIFF: Gauge = Gauge::new(
        "gethmon_sync_diff",
        "Last observed height difference (reference minus local, clamped at zero)"
    )
    .unwrap();
}

/// Metrics collector
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,
}

impl MetricsCollector {
    /// Create a new metrics collector with all monitor metrics registered
    pub fn new() -> Self {
        let registry = Registry::new();

        registry.register(Box::new(PROBES_TOTAL.clone())).unwrap();
        registry.register(Box::new(PROBE_DURATION.clone())).unwrap();
        registry.register(Box::new(LOCAL_HEIGHT.clone())).unwrap();
        registry.register(Box::new(REFERENCE_HEIGHT.clone())).unwrap();
        registry.register(Box::new(SYNC_DIFF.clone())).unwrap();

        Self {
            registry: Arc::new(registry),
        }
    }

    /// Gather metrics as Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_includes_probe_counter() {
        let collector = MetricsCollector::new();
        PROBES_TOTAL.with_label_values(&["ok"]).inc();

        let text = collector.gather().unwrap();
        assert!(text.contains("gethmon_probes_total"));
        assert!(text.contains("gethmon_sync_diff"));
    }
}
