//! Configuration loading from files on disk

use loadscope_core::{LoadScopeConfig, PatternKind};
use std::io::Write;
use std::path::PathBuf;

fn sample_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/loadscope.yaml")
}

#[test]
fn test_shipped_sample_config_is_valid() {
    let config = LoadScopeConfig::from_file(sample_config_path()).unwrap();

    assert_eq!(config.load_pattern.pattern, PatternKind::RampUp);
    assert_eq!(config.load_pattern.peak_users, 50);
    assert_eq!(config.load_pattern.ramp_up_ms, Some(60_000));
    assert_eq!(config.scenarios.len(), 2);
    assert_eq!(config.scenarios[0].effective_weight(), 3.0);
    assert_eq!(config.scenarios[1].payload["max_tokens"], 1024);
    assert_eq!(config.target.capacity_users, Some(45));
    assert_eq!(config.thresholds.latency_factor, 1.5);
}

#[test]
fn test_partial_toml_falls_back_to_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[run]
think_time_ms = 0

[load_pattern]
pattern = "spike"
initial_users = 2
peak_users = 40
duration_ms = 30000
spike_interval_ms = 5000

[[scenarios]]
name = "burst"
payload = {{ size = 4 }}
"#
    )
    .unwrap();

    let config = LoadScopeConfig::from_file(file.path()).unwrap();

    assert_eq!(config.run.think_time_ms, 0);
    assert_eq!(config.run.timeout_ms, 30_000);
    assert_eq!(config.run.window_size_ms, 10_000);
    assert_eq!(config.load_pattern.pattern, PatternKind::Spike);
    assert_eq!(config.load_pattern.spike_interval_ms, Some(5_000));
    assert_eq!(config.scenarios[0].name, "burst");
    assert_eq!(config.logging.format, "pretty");
}

#[test]
fn test_invalid_pattern_rejected_on_load() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "load_pattern:\n  pattern: stress\n  initial_users: 10\n  peak_users: 5\n  duration_ms: 1000"
    )
    .unwrap();

    let err = LoadScopeConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("initial_users"), "{err}");
}
