//! Offline analysis of recorded request results
//!
//! Covers the path the CLI `analyze` command takes: request results saved as
//! JSON are read back in arbitrary order and run through aggregation,
//! detection, classification and planning.

use chrono::{DateTime, Duration, Utc};
use loadscope_core::{BottleneckKind, MetricKind, RequestResult};
use loadscope_engine::{analyze, AnalysisOptions};

fn request(start_ms: i64, latency_ms: f64, success: bool, users: usize) -> RequestResult {
    let started_at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000 + start_ms).unwrap();
    RequestResult {
        scenario: if start_ms % 3 == 0 { "search" } else { "insert" }.to_string(),
        started_at,
        ended_at: started_at + Duration::milliseconds(latency_ms as i64),
        latency_ms,
        success,
        error: (!success).then(|| "target overloaded: too many requests".to_string()),
        concurrent_users: users,
        response_size: success.then_some(512),
    }
}

/// Ten 1s windows: healthy until 10 users, then errors and throughput collapse.
fn recorded_run() -> Vec<RequestResult> {
    let mut requests = Vec::new();
    for window in 0..10i64 {
        let users = (window as usize + 1) * 2;
        let (count, latency, failures) = if users <= 10 {
            (20, 100.0, 0)
        } else {
            (8, 110.0, 4)
        };
        for i in 0..count {
            let start = window * 1_000 + i * (1_000 / count);
            requests.push(request(start, latency, i >= count - failures, users));
        }
    }
    requests
}

#[test]
fn test_analysis_of_saved_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requests.json");

    // Save in completion order reversed to mimic out-of-order arrival
    let mut saved = recorded_run();
    saved.reverse();
    std::fs::write(&path, serde_json::to_vec(&saved).unwrap()).unwrap();

    let loaded: Vec<RequestResult> =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(loaded, saved);

    let options = AnalysisOptions {
        window_size_ms: 1_000,
        ..AnalysisOptions::new(20)
    };
    let analysis = analyze(&loaded, None, &options);

    // 5 healthy windows of 20, 5 degraded windows of 8
    assert_eq!(analysis.windows.len(), 10);
    assert_eq!(analysis.overall.total_requests, 140);
    assert_eq!(analysis.overall.failed_requests, 20);
    assert_eq!(analysis.overall.total_response_bytes, 120 * 512);

    // Degraded windows each emit throughput (4/s < 14/s) and error rate (50% > 5%)
    let throughput_points = analysis
        .degradation_points
        .iter()
        .filter(|p| p.metric == MetricKind::Throughput)
        .count();
    let error_points = analysis
        .degradation_points
        .iter()
        .filter(|p| p.metric == MetricKind::ErrorRate)
        .count();
    assert_eq!(throughput_points, 5);
    assert_eq!(error_points, 5);
    assert!(analysis
        .degradation_points
        .iter()
        .all(|p| p.metric != MetricKind::Latency));

    let kinds: Vec<BottleneckKind> = analysis.capacity.bottlenecks.iter().map(|b| b.kind).collect();
    assert_eq!(kinds, vec![BottleneckKind::Provider, BottleneckKind::Cpu]);

    assert_eq!(analysis.capacity.max_concurrent_users, 12);
    assert_eq!(analysis.capacity.recommended_peak_capacity, 9);
    // Capacity statement plus one line per bottleneck kind
    assert_eq!(analysis.capacity.recommendations.len(), 3);
}

#[test]
fn test_analysis_is_order_independent() {
    let requests = recorded_run();
    let mut shuffled = requests.clone();
    // Deterministic interleave: odds then evens
    shuffled.sort_by_key(|r| (r.start_ms() % 2, std::cmp::Reverse(r.start_ms())));

    let options = AnalysisOptions {
        window_size_ms: 1_000,
        ..AnalysisOptions::new(20)
    };
    let a = analyze(&requests, Some(10.0), &options);
    let b = analyze(&shuffled, Some(10.0), &options);

    assert_eq!(a.windows, b.windows);
    assert_eq!(a.degradation_points, b.degradation_points);
    assert_eq!(a.capacity, b.capacity);
    assert_eq!(a.overall, b.overall);
}
