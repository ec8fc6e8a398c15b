use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for catalog loads and scans.
#[derive(Debug)]
pub struct ScanMetrics {
    loads: AtomicU64,
    items_loaded: AtomicU64,
    fetch_failures: AtomicU64,
    parse_failures: AtomicU64,
    scans: AtomicU64,
    items_emitted: AtomicU64,
    duplicates_skipped: AtomicU64,
    total_scan_micros: AtomicU64,
    start_time: Instant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub loads: u64,
    pub items_loaded: u64,
    pub fetch_failures: u64,
    pub parse_failures: u64,
    pub scans: u64,
    pub items_emitted: u64,
    pub duplicates_skipped: u64,
    pub average_scan_ms: f64,
    pub uptime_seconds: u64,
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            loads: AtomicU64::new(0),
            items_loaded: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            scans: AtomicU64::new(0),
            items_emitted: AtomicU64::new(0),
            duplicates_skipped: AtomicU64::new(0),
            total_scan_micros: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn increment_loads(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_items_loaded(&self, count: u64) {
        self.items_loaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_fetch_failures(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_parse_failures(&self, count: u64) {
        self.parse_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_scan(&self, emitted: usize, duplicates: usize, elapsed: Duration) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.items_emitted.fetch_add(emitted as u64, Ordering::Relaxed);
        self.duplicates_skipped.fetch_add(duplicates as u64, Ordering::Relaxed);
        self.total_scan_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn get_average_scan_ms(&self) -> f64 {
        let scans = self.scans.load(Ordering::Relaxed);
        if scans == 0 {
            0.0
        } else {
            self.total_scan_micros.load(Ordering::Relaxed) as f64 / scans as f64 / 1000.0
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            loads: self.loads.load(Ordering::Relaxed),
            items_loaded: self.items_loaded.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            items_emitted: self.items_emitted.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            average_scan_ms: self.get_average_scan_ms(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    pub fn log_summary(&self) {
        let snap = self.snapshot();
        tracing::info!(
            "📊 Loads: {} ({} items, {} fetch failures, {} bad records) | Scans: {} ({} emitted, {} duplicates, avg {:.2}ms)",
            snap.loads,
            snap.items_loaded,
            snap.fetch_failures,
            snap.parse_failures,
            snap.scans,
            snap.items_emitted,
            snap.duplicates_skipped,
            snap.average_scan_ms
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_counters() {
        let metrics = ScanMetrics::new();
        metrics.increment_loads();
        metrics.add_items_loaded(12);
        metrics.record_scan(5, 2, Duration::from_millis(4));
        metrics.record_scan(3, 0, Duration::from_millis(2));

        let snap = metrics.snapshot();
        assert_eq!(snap.loads, 1);
        assert_eq!(snap.items_loaded, 12);
        assert_eq!(snap.scans, 2);
        assert_eq!(snap.items_emitted, 8);
        assert_eq!(snap.duplicates_skipped, 2);
        assert!((snap.average_scan_ms - 3.0).abs() < 0.01);
    }
}
