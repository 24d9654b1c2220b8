//! Report generation for load test results

use loadscope_core::{CoreResult, LoadTestResults};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Report format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

const RULE: &str = "============================================================";

/// Render the human-readable report.
///
/// Section order and headings are stable: TEST CONFIGURATION, OVERALL
/// METRICS, PERFORMANCE DEGRADATION (or a pass line when clean), CAPACITY
/// RECOMMENDATIONS.
pub fn format_report(results: &LoadTestResults) -> String {
    let config = &results.configuration;
    let overall = &results.overall;
    let capacity = &results.capacity;
    let mut lines = Vec::new();

    lines.push(RULE.to_string());
    lines.push(format!("LOAD TEST REPORT  run {}", results.run_id));
    lines.push(RULE.to_string());
    lines.push(String::new());

    lines.push("TEST CONFIGURATION".to_string());
    lines.push(format!("  Pattern:      {}", config.load_pattern.description()));
    lines.push(format!(
        "  Duration:     {:.1}s{}",
        results.duration_ms() as f64 / 1000.0,
        if results.cancelled { " (cancelled)" } else { "" }
    ));
    lines.push(format!(
        "  Scenarios:    {}",
        config
            .scenarios
            .iter()
            .map(|s| format!("{} (weight {})", s.name, s.effective_weight()))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    lines.push(format!("  Timeout:      {}ms", config.timeout_ms));
    lines.push(format!("  Think time:   {}ms", config.think_time_ms));
    lines.push(format!("  Window size:  {}ms", config.window_size_ms));
    lines.push(String::new());

    lines.push("OVERALL METRICS".to_string());
    lines.push(format!("  Total requests:   {}", overall.total_requests));
    lines.push(format!("  Successful:       {}", overall.successful_requests));
    lines.push(format!(
        "  Failed:           {} ({} timed out)",
        overall.failed_requests, overall.timed_out_requests
    ));
    lines.push(format!("  Error rate:       {:.2}%", overall.error_rate * 100.0));
    lines.push(format!("  Throughput:       {:.2} req/s", overall.throughput));
    lines.push(format!(
        "  Latency (ms):     min {:.1}  avg {:.1}  max {:.1}",
        overall.min_latency_ms, overall.avg_latency_ms, overall.max_latency_ms
    ));
    lines.push(format!(
        "  Percentiles (ms): p50 {:.1}  p90 {:.1}  p95 {:.1}  p99 {:.1}",
        overall.p50_latency_ms,
        overall.p90_latency_ms,
        overall.p95_latency_ms,
        overall.p99_latency_ms
    ));
    lines.push(format!("  Response bytes:   {}", overall.total_response_bytes));
    for (scenario, count) in &overall.requests_by_scenario {
        lines.push(format!("    {}: {} requests", scenario, count));
    }
    lines.push(String::new());

    if results.degradation_points.is_empty() {
        lines.push("PASSED: no performance degradation detected".to_string());
    } else {
        lines.push("PERFORMANCE DEGRADATION".to_string());
        for point in &results.degradation_points {
            lines.push(format!(
                "  [{}] {} at {} users: {:.3} -> {:.3} ({:+.1}%)",
                point.timestamp.format("%H:%M:%S"),
                point.metric,
                point.concurrent_users,
                point.baseline_value,
                point.degraded_value,
                point.degradation_percent
            ));
        }
    }
    lines.push(String::new());

    lines.push("CAPACITY RECOMMENDATIONS".to_string());
    lines.push(format!(
        "  Max concurrent users:       {}",
        capacity.max_concurrent_users
    ));
    lines.push(format!(
        "  Recommended peak capacity:  {} ({:.0}% safety margin)",
        capacity.recommended_peak_capacity,
        capacity.safety_margin * 100.0
    ));
    for bottleneck in &capacity.bottlenecks {
        lines.push(format!(
            "  Bottleneck: {} ({:.0}% confidence) {}",
            bottleneck.kind,
            bottleneck.confidence * 100.0,
            bottleneck.description
        ));
        for evidence in &bottleneck.evidence {
            lines.push(format!("    - {}", evidence));
        }
    }
    for recommendation in &capacity.recommendations {
        lines.push(format!("  * {}", recommendation));
    }
    lines.push(RULE.to_string());

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

/// Serialize the full results, raw requests included.
pub fn to_json(results: &LoadTestResults) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

/// Write report to file
pub fn write_report(
    results: &LoadTestResults,
    path: impl AsRef<Path>,
    format: ReportFormat,
) -> CoreResult<()> {
    let content = match format {
        ReportFormat::Text => format_report(results),
        ReportFormat::Json => to_json(results)?,
    };

    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
