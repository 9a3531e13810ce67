//! Ingest metrics
//!
//! Prometheus counters and a latency histogram for pipeline outcomes. Each
//! pipeline owns its own registry, so several pipelines (and tests) never
//! collide on metric names.

use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::{Error, Result};

/// Outcome label of `scan_intake_bundles_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleOutcome {
    Accepted,
    Duplicate,
    Rejected,
}

impl BundleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleOutcome::Accepted => "accepted",
            BundleOutcome::Duplicate => "duplicate",
            BundleOutcome::Rejected => "rejected",
        }
    }
}

/// Pipeline metrics.
#[derive(Clone)]
pub struct IngestMetrics {
    registry: Registry,
    bundles_total: IntCounterVec,
    drives_created_total: IntCounter,
    parse_warnings_total: IntCounter,
    ingest_seconds: Histogram,
}

impl std::fmt::Debug for IngestMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestMetrics")
            .field("accepted", &self.bundles(BundleOutcome::Accepted))
            .field("duplicate", &self.bundles(BundleOutcome::Duplicate))
            .field("rejected", &self.bundles(BundleOutcome::Rejected))
            .finish()
    }
}

impl IngestMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let bundles_total = IntCounterVec::new(
            Opts::new("scan_intake_bundles_total", "Scan bundles processed by outcome"),
            &["outcome"],
        )?;
        let drives_created_total = IntCounter::new(
            "scan_intake_drives_created_total",
            "Drive records created from scans and manual entry",
        )?;
        let parse_warnings_total = IntCounter::new(
            "scan_intake_parse_warnings_total",
            "Non-fatal extraction warnings",
        )?;
        let ingest_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "scan_intake_ingest_duration_seconds",
                "Time to process one scan bundle",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        )?;

        registry.register(Box::new(bundles_total.clone()))?;
        registry.register(Box::new(drives_created_total.clone()))?;
        registry.register(Box::new(parse_warnings_total.clone()))?;
        registry.register(Box::new(ingest_seconds.clone()))?;

        // Expose all three outcome series from the start.
        for outcome in [
            BundleOutcome::Accepted,
            BundleOutcome::Duplicate,
            BundleOutcome::Rejected,
        ] {
            bundles_total.with_label_values(&[outcome.as_str()]);
        }

        Ok(Self {
            registry,
            bundles_total,
            drives_created_total,
            parse_warnings_total,
            ingest_seconds,
        })
    }

    pub fn record_bundle(&self, outcome: BundleOutcome, elapsed: Duration) {
        self.bundles_total
            .with_label_values(&[outcome.as_str()])
            .inc();
        self.ingest_seconds.observe(elapsed.as_secs_f64());
    }

    pub fn record_drives_created(&self, count: usize) {
        self.drives_created_total.inc_by(count as u64);
    }

    pub fn record_parse_warnings(&self, count: usize) {
        self.parse_warnings_total.inc_by(count as u64);
    }

    /// Current count for one outcome.
    pub fn bundles(&self, outcome: BundleOutcome) -> u64 {
        self.bundles_total
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    pub fn drives_created(&self) -> u64 {
        self.drives_created_total.get()
    }

    pub fn parse_warnings(&self) -> u64 {
        self.parse_warnings_total.get()
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| Error::Internal(format!("Metrics output is not UTF-8: {}", e)))
    }
}
