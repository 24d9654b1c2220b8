//! Time-window aggregation and latency statistics

use chrono::{DateTime, Utc};
use loadscope_core::{OverallMetrics, RequestResult, TimeWindowMetrics};
use std::collections::BTreeMap;

/// Nearest-rank percentile of `values`.
///
/// Sorts a copy ascending and selects index `ceil(p/100 * n) - 1`, clamped
/// to the valid range. Returns 0 for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as i64 - 1;
    let index = rank.clamp(0, sorted.len() as i64 - 1) as usize;
    sorted[index]
}

/// Bucket `results` into fixed windows keyed by each request's start time.
///
/// Windows are half-open `[start, start + window_size_ms)` and begin at the
/// earliest start time in the input. Windows that received no requests are
/// omitted. The output is in chronological order.
pub fn aggregate_windows(results: &[RequestResult], window_size_ms: u64) -> Vec<TimeWindowMetrics> {
    if window_size_ms == 0 {
        tracing::warn!("Window size of 0ms requested; no windows produced");
        return Vec::new();
    }
    let Some(origin) = results.iter().map(RequestResult::start_ms).min() else {
        return Vec::new();
    };

    let size = i64::try_from(window_size_ms).unwrap_or(i64::MAX);
    let mut buckets: BTreeMap<i64, Vec<&RequestResult>> = BTreeMap::new();
    for result in results {
        let index = (result.start_ms() - origin) / size;
        buckets.entry(index).or_default().push(result);
    }

    buckets
        .into_iter()
        .map(|(index, members)| {
            let start_ms = origin + index * size;
            window_metrics(start_ms, start_ms.saturating_add(size), window_size_ms, &members)
        })
        .collect()
}

fn window_metrics(
    start_ms: i64,
    end_ms: i64,
    window_size_ms: u64,
    members: &[&RequestResult],
) -> TimeWindowMetrics {
    let total = members.len();
    let mut latencies: Vec<f64> = members
        .iter()
        .filter(|r| r.success)
        .map(|r| r.latency_ms)
        .collect();
    latencies.sort_unstable_by(f64::total_cmp);

    let successful = latencies.len();
    let failed = total - successful;
    let stats = LatencyStats::from_sorted(&latencies);

    TimeWindowMetrics {
        window_start: timestamp(start_ms),
        window_end: timestamp(end_ms),
        concurrent_users: members.iter().map(|r| r.concurrent_users).max().unwrap_or(0),
        total_requests: total,
        successful_requests: successful,
        failed_requests: failed,
        min_latency_ms: stats.min,
        avg_latency_ms: stats.avg,
        max_latency_ms: stats.max,
        p95_latency_ms: percentile_sorted(&latencies, 95.0),
        throughput: successful as f64 / (window_size_ms as f64 / 1000.0),
        error_rate: if total == 0 {
            0.0
        } else {
            failed as f64 / total as f64
        },
    }
}

/// Whole-run statistics over every recorded request.
///
/// `duration_secs` is the wall-clock length of the run; throughput is
/// successful requests divided by it.
pub fn overall_metrics(results: &[RequestResult], duration_secs: f64) -> OverallMetrics {
    let total = results.len();
    let mut latencies: Vec<f64> = results
        .iter()
        .filter(|r| r.success)
        .map(|r| r.latency_ms)
        .collect();
    latencies.sort_unstable_by(f64::total_cmp);

    let successful = latencies.len();
    let failed = total - successful;
    let stats = LatencyStats::from_sorted(&latencies);

    let mut requests_by_scenario = BTreeMap::new();
    for result in results {
        *requests_by_scenario
            .entry(result.scenario.clone())
            .or_insert(0usize) += 1;
    }

    OverallMetrics {
        total_requests: total,
        successful_requests: successful,
        failed_requests: failed,
        timed_out_requests: results.iter().filter(|r| r.is_timeout()).count(),
        error_rate: if total == 0 {
            0.0
        } else {
            failed as f64 / total as f64
        },
        throughput: if duration_secs > 0.0 {
            successful as f64 / duration_secs
        } else {
            0.0
        },
        min_latency_ms: stats.min,
        avg_latency_ms: stats.avg,
        max_latency_ms: stats.max,
        p50_latency_ms: percentile_sorted(&latencies, 50.0),
        p90_latency_ms: percentile_sorted(&latencies, 90.0),
        p95_latency_ms: percentile_sorted(&latencies, 95.0),
        p99_latency_ms: percentile_sorted(&latencies, 99.0),
        total_response_bytes: results.iter().filter_map(|r| r.response_size).sum(),
        requests_by_scenario,
    }
}

#[derive(Debug, Default)]
struct LatencyStats {
    min: f64,
    avg: f64,
    max: f64,
}

impl LatencyStats {
    fn from_sorted(sorted: &[f64]) -> Self {
        match (sorted.first(), sorted.last()) {
            (Some(&min), Some(&max)) => Self {
                min,
                max,
                avg: sorted.iter().sum::<f64>() / sorted.len() as f64,
            },
            _ => Self::default(),
        }
    }
}

fn timestamp(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(if ms < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}
