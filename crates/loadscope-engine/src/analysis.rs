//! Offline analysis pipeline: aggregate, detect, classify, plan

use crate::aggregator::{aggregate_windows, overall_metrics};
use crate::classifier::classify_bottlenecks;
use crate::detector::detect_degradation;
use crate::planner::{plan_capacity, DEFAULT_SAFETY_MARGIN};
use loadscope_core::{
    CapacityRecommendations, DegradationPoint, DegradationThresholds, OverallMetrics,
    RequestResult, RunConfig, TimeWindowMetrics,
};

/// Parameters for [`analyze`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub window_size_ms: u64,
    pub thresholds: DegradationThresholds,
    pub safety_margin: f64,
    /// Ceiling reported when nothing degraded.
    pub peak_users: usize,
}

impl AnalysisOptions {
    pub fn new(peak_users: usize) -> Self {
        Self {
            window_size_ms: 10_000,
            thresholds: DegradationThresholds::default(),
            safety_margin: DEFAULT_SAFETY_MARGIN,
            peak_users,
        }
    }

    /// Options matching a run configuration.
    pub fn from_run_config(run: &RunConfig, thresholds: DegradationThresholds, peak_users: usize) -> Self {
        Self {
            window_size_ms: run.window_size_ms,
            thresholds,
            safety_margin: run.safety_margin,
            peak_users,
        }
    }
}

/// Everything derived from a list of request results.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub overall: OverallMetrics,
    pub windows: Vec<TimeWindowMetrics>,
    pub degradation_points: Vec<DegradationPoint>,
    pub capacity: CapacityRecommendations,
}

/// Analyze recorded requests in arbitrary order.
///
/// `duration_secs` is the run length used for overall throughput; pass
/// `None` to use the span from the first request start to the last request
/// end. An empty input yields zeroed metrics and no windows.
pub fn analyze(
    requests: &[RequestResult],
    duration_secs: Option<f64>,
    options: &AnalysisOptions,
) -> Analysis {
    let duration_secs = duration_secs.unwrap_or_else(|| observed_span_secs(requests));

    let overall = overall_metrics(requests, duration_secs);
    let windows = aggregate_windows(requests, options.window_size_ms);
    let degradation_points = detect_degradation(&windows, &options.thresholds);
    let bottlenecks = classify_bottlenecks(&degradation_points);
    let capacity = plan_capacity(
        &degradation_points,
        options.peak_users,
        bottlenecks,
        options.safety_margin,
    );

    tracing::debug!(
        requests = requests.len(),
        windows = windows.len(),
        degradation_points = degradation_points.len(),
        max_concurrent_users = capacity.max_concurrent_users,
        "Analysis complete"
    );

    Analysis {
        overall,
        windows,
        degradation_points,
        capacity,
    }
}

fn observed_span_secs(requests: &[RequestResult]) -> f64 {
    let first = requests.iter().map(|r| r.started_at).min();
    let last = requests.iter().map(|r| r.ended_at).max();
    match (first, last) {
        (Some(first), Some(last)) => (last - first).num_milliseconds().max(0) as f64 / 1000.0,
        _ => 0.0,
    }
}
