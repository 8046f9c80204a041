//! Runtime metrics collection.
//!
//! Tracks analyses, phishing verdicts, and blocklist lookup health. The
//! lookup-failure counter is the operator-facing signal that the known-URL
//! store is degrading analyses (the engine itself never surfaces the fault).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::models::AnalysisVerdict;

/// Snapshot of the runtime counters for display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub analyses_total: u64,
    pub phishing_detected: u64,
    pub blocklist_hits: u64,
    pub blocklist_lookup_failures: u64,
}

/// Metrics collector for tracking and reporting.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    analyses_total: AtomicU64,
    phishing_detected: AtomicU64,
    blocklist_hits: AtomicU64,
    blocklist_lookup_failures: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed analysis.
    pub fn record_analysis(&self, verdict: &AnalysisVerdict) {
        self.analyses_total.fetch_add(1, Ordering::Relaxed);
        if verdict.is_phishing {
            self.phishing_detected.fetch_add(1, Ordering::Relaxed);
        }
        let hits = verdict.explanation.known_phishing_matches.len() as u64;
        if hits > 0 {
            self.blocklist_hits.fetch_add(hits, Ordering::Relaxed);
        }
    }

    /// Record a blocklist lookup failure that degraded an analysis.
    pub fn record_lookup_failure(&self) {
        self.blocklist_lookup_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            analyses_total: self.analyses_total.load(Ordering::Relaxed),
            phishing_detected: self.phishing_detected.load(Ordering::Relaxed),
            blocklist_hits: self.blocklist_hits.load(Ordering::Relaxed),
            blocklist_lookup_failures: self
                .blocklist_lookup_failures
                .load(Ordering::Relaxed),
        }
    }
}
