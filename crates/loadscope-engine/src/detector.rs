//! Degradation detection against a fixed baseline window

use loadscope_core::metrics::DEGRADATION_POINTS;
use loadscope_core::{DegradationPoint, DegradationThresholds, MetricKind, TimeWindowMetrics};

/// Error-rate floor used as the percent-change denominator.
const ERROR_RATE_FLOOR: f64 = 0.01;

/// Compare every window after the first against the first (chronological)
/// window and emit one point per threshold crossed.
///
/// The baseline never adapts: window N is always judged against window 1.
/// A single window can emit up to three points (latency, throughput,
/// error rate). Fewer than two windows yields no points.
pub fn detect_degradation(
    windows: &[TimeWindowMetrics],
    thresholds: &DegradationThresholds,
) -> Vec<DegradationPoint> {
    let mut ordered: Vec<&TimeWindowMetrics> = windows.iter().collect();
    ordered.sort_by_key(|w| w.window_start);

    let Some((baseline, rest)) = ordered.split_first() else {
        return Vec::new();
    };

    let mut points = Vec::new();
    for window in rest {
        // A zero baseline latency would make every later window "infinitely" worse
        if baseline.avg_latency_ms > 0.0
            && window.avg_latency_ms > baseline.avg_latency_ms * thresholds.latency_factor
        {
            points.push(point(
                window,
                MetricKind::Latency,
                baseline.avg_latency_ms,
                window.avg_latency_ms,
                percent_change(baseline.avg_latency_ms, window.avg_latency_ms),
            ));
        }

        if window.throughput < baseline.throughput * thresholds.throughput_factor {
            points.push(point(
                window,
                MetricKind::Throughput,
                baseline.throughput,
                window.throughput,
                percent_change(baseline.throughput, window.throughput),
            ));
        }

        if window.error_rate > thresholds.max_error_rate {
            let denominator = baseline.error_rate.max(ERROR_RATE_FLOOR);
            points.push(point(
                window,
                MetricKind::ErrorRate,
                baseline.error_rate,
                window.error_rate,
                percent_change(denominator, window.error_rate),
            ));
        }
    }

    for point in &points {
        DEGRADATION_POINTS
            .with_label_values(&[point.metric.as_str()])
            .inc();
        tracing::info!(
            metric = %point.metric,
            concurrent_users = point.concurrent_users,
            baseline = point.baseline_value,
            observed = point.degraded_value,
            percent = point.degradation_percent,
            "Performance degradation detected"
        );
    }

    points
}

fn point(
    window: &TimeWindowMetrics,
    metric: MetricKind,
    baseline_value: f64,
    degraded_value: f64,
    degradation_percent: f64,
) -> DegradationPoint {
    DegradationPoint {
        concurrent_users: window.concurrent_users,
        timestamp: window.window_start,
        metric,
        baseline_value,
        degraded_value,
        degradation_percent,
    }
}

/// Signed percent change from `base` to `value`.
fn percent_change(base: f64, value: f64) -> f64 {
    (value - base) * 100.0 / base
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn window(index: i64, users: usize, avg: f64, throughput: f64, error_rate: f64) -> TimeWindowMetrics {
        let start = DateTime::<Utc>::from_timestamp_millis(index * 10_000).unwrap();
        TimeWindowMetrics {
            window_start: start,
            window_end: start + chrono::Duration::seconds(10),
            concurrent_users: users,
            total_requests: 100,
            successful_requests: 100,
            failed_requests: 0,
            min_latency_ms: avg,
            avg_latency_ms: avg,
            max_latency_ms: avg,
            p95_latency_ms: avg,
            throughput,
            error_rate,
        }
    }

    #[test]
    fn test_latency_point_on_third_window() {
        let windows = vec![
            window(0, 5, 100.0, 10.0, 0.0),
            window(1, 10, 100.0, 10.0, 0.0),
            window(2, 15, 160.0, 10.0, 0.0),
        ];

        let points = detect_degradation(&windows, &DegradationThresholds::default());

        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_eq!(p.metric, MetricKind::Latency);
        assert_eq!(p.concurrent_users, 15);
        assert_eq!(p.timestamp, windows[2].window_start);
        assert_eq!(p.baseline_value, 100.0);
        assert_eq!(p.degraded_value, 160.0);
        assert_eq!(p.degradation_percent, 60.0);
    }

    #[test]
    fn test_baseline_never_emits() {
        let windows = vec![window(0, 1, 10_000.0, 0.0, 1.0)];
        assert!(detect_degradation(&windows, &DegradationThresholds::default()).is_empty());
        assert!(detect_degradation(&[], &DegradationThresholds::default()).is_empty());
    }

    #[test]
    fn test_baseline_is_fixed() {
        // Gradual 1.3x steps never trip a rolling comparison, but do against window 1
        let windows = vec![
            window(0, 1, 100.0, 10.0, 0.0),
            window(1, 2, 130.0, 10.0, 0.0),
            window(2, 3, 169.0, 10.0, 0.0),
        ];
        let points = detect_degradation(&windows, &DegradationThresholds::default());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].concurrent_users, 3);
    }

    #[test]
    fn test_baseline_is_chronological_not_positional() {
        let windows = vec![
            window(1, 10, 300.0, 10.0, 0.0),
            window(0, 5, 100.0, 10.0, 0.0),
        ];
        let points = detect_degradation(&windows, &DegradationThresholds::default());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].baseline_value, 100.0);
    }

    #[test]
    fn test_throughput_drop() {
        let windows = vec![
            window(0, 5, 100.0, 20.0, 0.0),
            window(1, 10, 100.0, 14.0, 0.0),
            window(2, 20, 100.0, 10.0, 0.0),
        ];
        let points = detect_degradation(&windows, &DegradationThresholds::default());

        // 14 is exactly 0.7x and is not a strict drop
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].metric, MetricKind::Throughput);
        assert_eq!(points[0].degradation_percent, -50.0);
    }

    #[test]
    fn test_error_rate_is_absolute_with_floor() {
        let windows = vec![
            window(0, 5, 100.0, 10.0, 0.0),
            window(1, 10, 100.0, 10.0, 0.05),
            window(2, 15, 100.0, 10.0, 0.2),
        ];
        let points = detect_degradation(&windows, &DegradationThresholds::default());

        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_eq!(p.metric, MetricKind::ErrorRate);
        assert_eq!(p.baseline_value, 0.0);
        // Relative to the 0.01 floor
        assert!((p.degradation_percent - 1_900.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_can_emit_all_three() {
        let windows = vec![
            window(0, 5, 100.0, 10.0, 0.0),
            window(1, 50, 400.0, 2.0, 0.5),
        ];
        let points = detect_degradation(&windows, &DegradationThresholds::default());
        let metrics: Vec<MetricKind> = points.iter().map(|p| p.metric).collect();
        assert_eq!(
            metrics,
            vec![MetricKind::Latency, MetricKind::Throughput, MetricKind::ErrorRate]
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let windows = vec![
            window(0, 5, 100.0, 10.0, 0.0),
            window(1, 10, 120.0, 10.0, 0.0),
        ];
        let strict = DegradationThresholds {
            latency_factor: 1.1,
            ..DegradationThresholds::default()
        };
        assert!(detect_degradation(&windows, &DegradationThresholds::default()).is_empty());
        assert_eq!(detect_degradation(&windows, &strict).len(), 1);
    }
}
