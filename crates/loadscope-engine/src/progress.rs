//! Live progress reporting during a run

use loadscope_core::RequestResult;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// Snapshot handed to the progress callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub elapsed: Duration,
    /// Virtual users requested by the load pattern at the last tick.
    pub target_users: usize,
    pub active_users: usize,
    pub completed_requests: usize,
    pub failed_requests: usize,
    /// Successful requests per second over the rolling window.
    pub rolling_throughput: f64,
    /// Average latency of successful requests over the rolling window.
    pub rolling_avg_latency_ms: f64,
}

/// Fixed-capacity window over the most recently completed requests.
#[derive(Debug)]
pub(crate) struct RollingStats {
    samples: VecDeque<Sample>,
    capacity: usize,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    start_ms: i64,
    end_ms: i64,
    latency_ms: f64,
    success: bool,
}

impl RollingStats {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn push(&mut self, result: &RequestResult) {
        self.samples.push_back(Sample {
            start_ms: result.start_ms(),
            end_ms: result.ended_at.timestamp_millis(),
            latency_ms: result.latency_ms,
            success: result.success,
        });
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Successful requests per second across the span the window covers.
    pub(crate) fn throughput(&self) -> f64 {
        let Some(first_start) = self.samples.iter().map(|s| s.start_ms).min() else {
            return 0.0;
        };
        let last_end = self.samples.iter().map(|s| s.end_ms).max().unwrap_or(first_start);
        let span_secs = (last_end - first_start) as f64 / 1000.0;
        if span_secs <= 0.0 {
            return 0.0;
        }
        self.successes().count() as f64 / span_secs
    }

    pub(crate) fn avg_latency_ms(&self) -> f64 {
        let (sum, count) = self
            .successes()
            .fold((0.0, 0usize), |(sum, count), s| (sum + s.latency_ms, count + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    fn successes(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|s| s.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn result(start_ms: i64, latency_ms: i64, success: bool) -> RequestResult {
        let started_at = DateTime::<Utc>::from_timestamp_millis(start_ms).unwrap();
        RequestResult {
            scenario: "s".to_string(),
            started_at,
            ended_at: started_at + chrono::Duration::milliseconds(latency_ms),
            latency_ms: latency_ms as f64,
            success,
            error: None,
            concurrent_users: 1,
            response_size: None,
        }
    }

    #[test]
    fn test_empty_window_is_zero() {
        let stats = RollingStats::new(100);
        assert_eq!(stats.throughput(), 0.0);
        assert_eq!(stats.avg_latency_ms(), 0.0);
    }

    #[test]
    fn test_rolling_stats_over_successes() {
        let mut stats = RollingStats::new(100);
        stats.push(&result(0, 100, true));
        stats.push(&result(500, 300, true));
        stats.push(&result(1_000, 1_000, false));

        // 2 successes over a 2 second span
        assert_eq!(stats.throughput(), 1.0);
        assert_eq!(stats.avg_latency_ms(), 200.0);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut stats = RollingStats::new(2);
        stats.push(&result(0, 10_000, true));
        stats.push(&result(1_000, 100, true));
        stats.push(&result(1_100, 100, true));

        assert_eq!(stats.avg_latency_ms(), 100.0);
    }
}
