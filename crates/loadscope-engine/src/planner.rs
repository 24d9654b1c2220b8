//! Capacity planning from detected degradation

use loadscope_core::{Bottleneck, BottleneckKind, CapacityRecommendations, DegradationPoint};
use std::collections::BTreeSet;

/// Default fraction held back from the measured ceiling.
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.2;

/// Derive safe operating capacity.
///
/// With no degradation the ceiling is the configured `peak_users`; otherwise
/// it is the lowest concurrency at which any metric degraded. The
/// recommended peak is the ceiling reduced by `safety_margin`, floored.
/// Margins outside `[0, 1]` are clamped and a non-finite margin falls back
/// to [`DEFAULT_SAFETY_MARGIN`], so the recommendation never exceeds the
/// ceiling.
pub fn plan_capacity(
    points: &[DegradationPoint],
    peak_users: usize,
    bottlenecks: Vec<Bottleneck>,
    safety_margin: f64,
) -> CapacityRecommendations {
    let safety_margin = if safety_margin.is_finite() {
        safety_margin.clamp(0.0, 1.0)
    } else {
        tracing::warn!(safety_margin, "Non-finite safety margin; using default");
        DEFAULT_SAFETY_MARGIN
    };
    let max_concurrent_users = points
        .iter()
        .map(|p| p.concurrent_users)
        .min()
        .unwrap_or(peak_users);
    let recommended_peak_capacity =
        (max_concurrent_users as f64 * (1.0 - safety_margin)).floor().max(0.0) as usize;

    let recommendations = if points.is_empty() {
        vec![format!(
            "No performance degradation detected up to {} concurrent users; \
             consider testing with a higher load to find the capacity limit",
            peak_users
        )]
    } else {
        let mut lines = vec![format!(
            "Performance degraded at {} concurrent users; keep sustained load at or below {} \
             concurrent users ({:.0}% safety margin)",
            max_concurrent_users,
            recommended_peak_capacity,
            safety_margin * 100.0
        )];
        let kinds: BTreeSet<BottleneckKind> = bottlenecks.iter().map(|b| b.kind).collect();
        lines.extend(kinds.into_iter().map(|kind| remediation(kind).to_string()));
        lines
    };

    CapacityRecommendations {
        max_concurrent_users,
        recommended_peak_capacity,
        safety_margin,
        bottlenecks,
        recommendations,
    }
}

fn remediation(kind: BottleneckKind) -> &'static str {
    match kind {
        BottleneckKind::Cpu => {
            "CPU: scale out processing capacity or reduce per-request compute"
        }
        BottleneckKind::Memory => {
            "Memory: increase available memory or reduce per-request allocation"
        }
        BottleneckKind::Network => {
            "Network: reduce payload sizes, enable connection reuse or move closer to the target"
        }
        BottleneckKind::Provider => {
            "Provider: raise upstream rate limits or add request queueing with backoff"
        }
        BottleneckKind::Unknown => {
            "Unknown: profile the target under load to locate the constraint"
        }
    }
}
