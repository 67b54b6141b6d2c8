//! Per-request metrics: atomic counters for totals, a bounded ring buffer of
//! the last 1000 response times for a rolling average, and a `/metrics`
//! Prometheus text endpoint.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;

const SAMPLE_WINDOW: usize = 1000;

pub struct Metrics {
    started_at: Instant,
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    recent_durations_ms: Mutex<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            recent_durations_ms: Mutex::new(VecDeque::with_capacity(SAMPLE_WINDOW)),
        }
    }

    pub fn record(&self, duration_ms: u64, success: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        let mut samples = self.recent_durations_ms.lock().expect("metrics mutex poisoned");
        if samples.len() == SAMPLE_WINDOW {
            samples.pop_front();
        }
        samples.push_back(duration_ms);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let samples = self.recent_durations_ms.lock().expect("metrics mutex poisoned");
        let avg_response_time_ms = if samples.is_empty() {
            0.0
        } else {
            samples.iter().sum::<u64>() as f64 / samples.len() as f64
        };

        MetricsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            successful: self.successful.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            avg_response_time_ms,
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }

    pub fn prometheus_text(&self) -> String {
        let s = self.snapshot();
        format!(
            "# TYPE devguard_requests_total counter\n\
             devguard_requests_total {total}\n\
             # TYPE devguard_requests_successful_total counter\n\
             devguard_requests_successful_total {successful}\n\
             # TYPE devguard_requests_failed_total counter\n\
             devguard_requests_failed_total {failed}\n\
             # TYPE devguard_response_time_ms_avg gauge\n\
             devguard_response_time_ms_avg {avg}\n\
             # TYPE devguard_uptime_seconds gauge\n\
             devguard_uptime_seconds {uptime}\n",
            total = s.total,
            successful = s.successful,
            failed = s.failed,
            avg = s.avg_response_time_ms,
            uptime = s.uptime_seconds,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub avg_response_time_ms: f64,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_totals_and_rolling_average() {
        let metrics = Metrics::new();
        metrics.record(10, true);
        metrics.record(20, true);
        metrics.record(30, false);

        let snap = metrics.snapshot();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.successful, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.avg_response_time_ms, 20.0);
    }

    #[test]
    fn keeps_only_the_last_window_of_samples() {
        let metrics = Metrics::new();
        for _ in 0..(SAMPLE_WINDOW + 5) {
            metrics.record(1, true);
        }
        let samples = metrics.recent_durations_ms.lock().unwrap();
        assert_eq!(samples.len(), SAMPLE_WINDOW);
    }
}
