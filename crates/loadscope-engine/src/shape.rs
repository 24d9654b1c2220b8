//! Load shape: target virtual users as a function of elapsed time

use loadscope_core::{PatternKind, ResolvedPattern};
use std::f64::consts::TAU;
use std::time::Duration;

/// Target concurrent users at `elapsed` since the start of the run.
///
/// Pure and stateless: the same pattern and elapsed time always yield the
/// same value.
pub fn users_at(pattern: &ResolvedPattern, elapsed: Duration) -> usize {
    let elapsed_ms = elapsed.as_millis() as u64;
    let initial = pattern.initial_users;
    let peak = pattern.peak_users;

    match pattern.pattern {
        PatternKind::Sustained => peak,

        PatternKind::RampUp => {
            if pattern.ramp_up_ms == 0 || elapsed_ms >= pattern.ramp_up_ms {
                peak
            } else {
                let progress = elapsed_ms as f64 / pattern.ramp_up_ms as f64;
                let delta = (peak as f64 - initial as f64) * progress;
                (initial as f64 + delta).floor().max(0.0) as usize
            }
        }

        PatternKind::Spike => {
            let index = elapsed_ms / pattern.spike_interval_ms.max(1);
            if index % 2 == 1 {
                peak
            } else {
                initial
            }
        }

        PatternKind::Wave => {
            let period = pattern.wave_period_ms.max(1);
            // Phase from the remainder keeps exact period multiples identical to t=0
            let phase = (elapsed_ms % period) as f64 / period as f64;
            let midpoint = (initial as f64 + peak as f64) / 2.0;
            let users = (midpoint + pattern.wave_amplitude * (TAU * phase).sin()).floor();
            (users.max(0.0) as usize).max(initial)
        }

        PatternKind::Stress => {
            let steps = elapsed_ms / pattern.stress_step_duration_ms.max(1);
            let added = (steps as usize).saturating_mul(pattern.stress_step_users);
            initial.saturating_add(added).min(peak)
        }
    }
}
