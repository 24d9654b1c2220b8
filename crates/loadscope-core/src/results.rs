//! Analysis output types
//!
//! Everything in this module is plain data: safe to serialize to JSON
//! verbatim and free of live handles or callbacks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ids::RunId;
use crate::pattern::LoadPatternConfig;
use crate::record::RequestResult;
use crate::scenario::ScenarioTemplate;

/// Statistics for one non-empty fixed-size time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindowMetrics {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Highest concurrency tag among requests started in the window.
    pub concurrent_users: usize,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub min_latency_ms: f64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
    pub p95_latency_ms: f64,
    /// Successful requests per second.
    pub throughput: f64,
    /// Failed / total (0.0-1.0)
    pub error_rate: f64,
}

/// Metric that crossed a degradation threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Latency,
    Throughput,
    ErrorRate,
}

impl MetricKind {
    /// Label used in metrics and reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latency => "latency",
            Self::Throughput => "throughput",
            Self::ErrorRate => "error_rate",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A window whose metric degraded relative to the baseline window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationPoint {
    pub concurrent_users: usize,
    /// Start of the degraded window.
    pub timestamp: DateTime<Utc>,
    pub metric: MetricKind,
    pub baseline_value: f64,
    pub degraded_value: f64,
    pub degradation_percent: f64,
}

/// Probable resource bottleneck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleneckKind {
    Cpu,
    Memory,
    Network,
    Provider,
    Unknown,
}

impl fmt::Display for BottleneckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Memory => write!(f, "memory"),
            Self::Network => write!(f, "network"),
            Self::Provider => write!(f, "provider"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Heuristic bottleneck classification with supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub kind: BottleneckKind,
    pub description: String,
    /// Confidence in the classification (0.0-1.0)
    pub confidence: f64,
    pub evidence: Vec<String>,
}

/// Safe operating capacity derived from degradation points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CapacityRecommendations {
    /// Concurrency reached before the first degradation.
    pub max_concurrent_users: usize,
    pub recommended_peak_capacity: usize,
    /// Fraction subtracted from `max_concurrent_users` (0.0-1.0)
    pub safety_margin: f64,
    pub bottlenecks: Vec<Bottleneck>,
    pub recommendations: Vec<String>,
}

/// Whole-run counts, rates and latency distribution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub timed_out_requests: usize,
    /// Failed / total (0.0-1.0)
    pub error_rate: f64,
    /// Successful requests per second over the run duration.
    pub throughput: f64,
    pub min_latency_ms: f64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p90_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub total_response_bytes: u64,
    /// Requests issued per scenario name.
    pub requests_by_scenario: BTreeMap<String, usize>,
}

/// Settings a run was executed with, echoed into its results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfiguration {
    pub load_pattern: LoadPatternConfig,
    pub scenarios: Vec<ScenarioTemplate>,
    pub timeout_ms: u64,
    pub think_time_ms: u64,
    pub window_size_ms: u64,
}

/// Complete output of a load test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTestResults {
    pub run_id: RunId,
    pub configuration: TestConfiguration,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Whether the run was cancelled before its configured duration.
    #[serde(default)]
    pub cancelled: bool,
    pub overall: OverallMetrics,
    pub windows: Vec<TimeWindowMetrics>,
    pub requests: Vec<RequestResult>,
    pub degradation_points: Vec<DegradationPoint>,
    pub capacity: CapacityRecommendations,
}

impl LoadTestResults {
    /// Wall-clock duration of the run in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }

    /// Whether the run finished without any degradation point.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degradation_points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&MetricKind::ErrorRate).unwrap(),
            "\"error_rate\""
        );
        assert_eq!(
            serde_json::to_string(&BottleneckKind::Provider).unwrap(),
            "\"provider\""
        );
        assert_eq!(BottleneckKind::Cpu.to_string(), "cpu");
    }
}
