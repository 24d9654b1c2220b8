//! Load pattern configuration
//!
//! A [`LoadPatternConfig`] describes how the number of concurrent virtual
//! users should change over the course of a run. Pattern-specific tunables
//! are optional and resolved deterministically from the required fields.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Shape of the concurrency curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    /// Linear ramp from initial to peak users, then hold.
    RampUp,
    /// Constant peak users.
    Sustained,
    /// Alternate between initial and peak users.
    Spike,
    /// Sinusoid around the midpoint of initial and peak users.
    Wave,
    /// Staircase from initial users up to peak users.
    Stress,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RampUp => "ramp-up",
            Self::Sustained => "sustained",
            Self::Spike => "spike",
            Self::Wave => "wave",
            Self::Stress => "stress",
        };
        f.write_str(name)
    }
}

/// Load pattern as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPatternConfig {
    /// Pattern kind
    pub pattern: PatternKind,

    /// Users at the start of the run (and the trough of spike/wave)
    #[serde(default)]
    pub initial_users: usize,

    /// Maximum users
    pub peak_users: usize,

    /// Total run duration in milliseconds
    pub duration_ms: u64,

    /// Ramp length (default: 30% of duration)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp_up_ms: Option<u64>,

    /// Spike toggle interval (default: duration / 10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spike_interval_ms: Option<u64>,

    /// Wave amplitude in users (default: half the initial..peak range)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_amplitude: Option<f64>,

    /// Wave period (default: duration / 4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_period_ms: Option<u64>,

    /// Users added per stress step (default: max(1, peak / 10))
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_step_users: Option<usize>,

    /// Stress step length (default: duration / 10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_step_duration_ms: Option<u64>,
}

impl LoadPatternConfig {
    /// Create a pattern with every tunable left at its default.
    pub fn new(pattern: PatternKind, initial_users: usize, peak_users: usize, duration_ms: u64) -> Self {
        Self {
            pattern,
            initial_users,
            peak_users,
            duration_ms,
            ramp_up_ms: None,
            spike_interval_ms: None,
            wave_amplitude: None,
            wave_period_ms: None,
            stress_step_users: None,
            stress_step_duration_ms: None,
        }
    }

    /// Validate required fields and explicit tunables.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first offending field.
    pub fn validate(&self) -> CoreResult<()> {
        if self.peak_users == 0 {
            return Err(CoreError::invalid_config("load_pattern.peak_users must be > 0"));
        }
        if self.initial_users > self.peak_users {
            return Err(CoreError::invalid_config(
                "load_pattern.initial_users must be <= peak_users",
            ));
        }
        if self.duration_ms == 0 {
            return Err(CoreError::invalid_config("load_pattern.duration_ms must be > 0"));
        }
        if let Some(amplitude) = self.wave_amplitude {
            if !amplitude.is_finite() || amplitude < 0.0 {
                return Err(CoreError::invalid_config(
                    "load_pattern.wave_amplitude must be a non-negative number",
                ));
            }
        }
        for (field, value) in [
            ("spike_interval_ms", self.spike_interval_ms),
            ("wave_period_ms", self.wave_period_ms),
            ("stress_step_duration_ms", self.stress_step_duration_ms),
        ] {
            if value == Some(0) {
                return Err(CoreError::invalid_config(format!(
                    "load_pattern.{field} must be > 0"
                )));
            }
        }
        Ok(())
    }

    /// Fill in every omitted tunable.
    #[must_use]
    pub fn resolve(&self) -> ResolvedPattern {
        let duration = self.duration_ms;
        let tenth = (duration / 10).max(1);

        ResolvedPattern {
            pattern: self.pattern,
            initial_users: self.initial_users,
            peak_users: self.peak_users,
            duration_ms: duration,
            ramp_up_ms: self.ramp_up_ms.unwrap_or(duration * 3 / 10),
            spike_interval_ms: self.spike_interval_ms.unwrap_or(tenth),
            wave_amplitude: self.wave_amplitude.unwrap_or_else(|| {
                self.peak_users.saturating_sub(self.initial_users) as f64 / 2.0
            }),
            wave_period_ms: self.wave_period_ms.unwrap_or((duration / 4).max(1)),
            stress_step_users: self
                .stress_step_users
                .unwrap_or((self.peak_users / 10).max(1)),
            stress_step_duration_ms: self.stress_step_duration_ms.unwrap_or(tenth),
        }
    }

    /// Get description of this load pattern
    pub fn description(&self) -> String {
        match self.pattern {
            PatternKind::Sustained => format!("Sustained {} users", self.peak_users),
            kind => format!("{} {} → {} users", kind, self.initial_users, self.peak_users),
        }
    }
}

/// Load pattern with every tunable resolved to a concrete value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPattern {
    pub pattern: PatternKind,
    pub initial_users: usize,
    pub peak_users: usize,
    pub duration_ms: u64,
    pub ramp_up_ms: u64,
    pub spike_interval_ms: u64,
    pub wave_amplitude: f64,
    pub wave_period_ms: u64,
    pub stress_step_users: usize,
    pub stress_step_duration_ms: u64,
}
