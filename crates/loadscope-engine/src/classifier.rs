//! Heuristic bottleneck classification

use loadscope_core::{Bottleneck, BottleneckKind, DegradationPoint, MetricKind};

/// Map degradation points to probable bottlenecks.
///
/// Only the first point of each metric contributes evidence. Output order is
/// always provider, network, cpu regardless of the order points were
/// detected in.
///
/// | Signal                               | Bottleneck | Confidence |
/// |--------------------------------------|------------|------------|
/// | any error-rate degradation           | provider   | 0.80       |
/// | latency without throughput loss      | network    | 0.70       |
/// | any throughput degradation           | cpu        | 0.75       |
pub fn classify_bottlenecks(points: &[DegradationPoint]) -> Vec<Bottleneck> {
    let first = |metric: MetricKind| points.iter().find(|p| p.metric == metric);
    let latency = first(MetricKind::Latency);
    let throughput = first(MetricKind::Throughput);
    let error_rate = first(MetricKind::ErrorRate);

    let mut bottlenecks = Vec::new();

    if let Some(p) = error_rate {
        bottlenecks.push(Bottleneck {
            kind: BottleneckKind::Provider,
            description: "Target is rejecting or failing requests under load".to_string(),
            confidence: 0.8,
            evidence: vec![format!(
                "Error rate reached {:.1}% at {} concurrent users (baseline {:.1}%)",
                p.degraded_value * 100.0,
                p.concurrent_users,
                p.baseline_value * 100.0
            )],
        });
    }

    if let (Some(p), None) = (latency, throughput) {
        bottlenecks.push(Bottleneck {
            kind: BottleneckKind::Network,
            description: "Latency grew without loss of throughput, suggesting transport delay"
                .to_string(),
            confidence: 0.7,
            evidence: vec![
                format!(
                    "Average latency rose {:.1}% to {:.1}ms at {} concurrent users",
                    p.degradation_percent, p.degraded_value, p.concurrent_users
                ),
                "Throughput stayed within threshold".to_string(),
            ],
        });
    }

    if let Some(p) = throughput {
        bottlenecks.push(Bottleneck {
            kind: BottleneckKind::Cpu,
            description: "Throughput dropped, suggesting a processing capacity ceiling"
                .to_string(),
            confidence: 0.75,
            evidence: vec![format!(
                "Throughput fell {:.1}% to {:.2} req/s at {} concurrent users",
                p.degradation_percent.abs(),
                p.degraded_value,
                p.concurrent_users
            )],
        });
    }

    bottlenecks
}
