//! Process-wide counters for module runs and HEAD probes.
//!
//! The runner records every module it executes and every module that ends in
//! a `failed` report; the probe helper records issued and timed-out probes.
//! A binary reads the totals once through [`Metrics::snapshot`] or logs them
//! with [`Metrics::flush`] before exiting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

pub static METRICS: Metrics = Metrics::new();

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub modules_executed: u64,
    pub modules_failed: u64,
    pub probes_issued: u64,
    pub probes_timed_out: u64,
}

impl MetricsSnapshot {
    /// Modules whose report was not `failed`.
    pub fn modules_completed(&self) -> u64 {
        self.modules_executed.saturating_sub(self.modules_failed)
    }
}

#[derive(Debug, Default)]
pub struct Metrics {
    modules_executed: AtomicU64,
    modules_failed: AtomicU64,
    probes_issued: AtomicU64,
    probes_timed_out: AtomicU64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            modules_executed: AtomicU64::new(0),
            modules_failed: AtomicU64::new(0),
            probes_issued: AtomicU64::new(0),
            probes_timed_out: AtomicU64::new(0),
        }
    }

    pub fn record_module_run(&self) {
        self.modules_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_module_failure(&self) {
        self.modules_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe(&self) {
        self.probes_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Only probes cut off by the configured timeout; cancelled probes are
    /// not counted here.
    pub fn record_probe_timeout(&self) {
        self.probes_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            modules_executed: self.modules_executed.load(Ordering::Relaxed),
            modules_failed: self.modules_failed.load(Ordering::Relaxed),
            probes_issued: self.probes_issued.load(Ordering::Relaxed),
            probes_timed_out: self.probes_timed_out.load(Ordering::Relaxed),
        }
    }

    /// Log the current totals as one `sitediag.metrics` event.
    pub fn flush(&self) {
        let totals = self.snapshot();
        tracing::info!(
            event = "sitediag.metrics",
            modules_executed = totals.modules_executed,
            modules_completed = totals.modules_completed(),
            modules_failed = totals.modules_failed,
            probes_issued = totals.probes_issued,
            probes_timed_out = totals.probes_timed_out,
        );
    }

    pub fn reset(&self) {
        for counter in [
            &self.modules_executed,
            &self.modules_failed,
            &self.probes_issued,
            &self.probes_timed_out,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
