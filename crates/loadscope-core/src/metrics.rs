//! Central metrics registry and metric definitions
//!
//! Prometheus metrics for load generation. Metrics are registered lazily on
//! first access using once_cell::Lazy.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder,
    HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

// ===== Request Metrics =====

/// Total number of requests issued by virtual users, by scenario and status
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "loadscope_requests_total",
        "Total number of requests issued by virtual users",
        &["scenario", "status"]
    )
    .expect("Failed to register request counter")
});

/// Request latency histogram
pub static REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "loadscope_request_duration_seconds",
        "Request latency in seconds",
        &["scenario"],
        // Buckets: 10ms .. 60s
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to register request duration histogram")
});

// ===== Virtual User Metrics =====

/// Virtual users currently running
pub static ACTIVE_VIRTUAL_USERS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "loadscope_virtual_users_active",
        "Virtual users currently running"
    )
    .expect("Failed to register active virtual users gauge")
});

/// Virtual users requested by the load pattern at the last tick
pub static TARGET_VIRTUAL_USERS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "loadscope_virtual_users_target",
        "Virtual users requested by the load pattern"
    )
    .expect("Failed to register target virtual users gauge")
});

// ===== Analysis Metrics =====

/// Degradation points detected, by metric
pub static DEGRADATION_POINTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "loadscope_degradation_points_total",
        "Degradation points detected",
        &["metric"]
    )
    .expect("Failed to register degradation point counter")
});

/// Render every registered metric in the Prometheus text format.
pub fn export_text() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
