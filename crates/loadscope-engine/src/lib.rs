//! Load generation and degradation analysis engine.
//!
//! The [`LoadTester`] drives virtual users against a [`LoadTarget`] along a
//! load pattern and hands the recorded requests to the analysis pipeline:
//!
//! ```text
//! RequestResult* -> aggregate_windows -> detect_degradation
//!                -> classify_bottlenecks -> plan_capacity
//! ```
//!
//! Each analysis stage is a pure function and can be used on its own, or all
//! together through [`analyze`] on previously recorded results.
//!
//! [`LoadTarget`]: loadscope_core::LoadTarget

pub mod aggregator;
pub mod analysis;
pub mod classifier;
pub mod controller;
pub mod detector;
pub mod executor;
pub mod planner;
pub mod progress;
pub mod report;
pub mod selector;
pub mod shape;
pub mod simulated;

pub use aggregator::{aggregate_windows, overall_metrics, percentile};
pub use analysis::{analyze, Analysis, AnalysisOptions};
pub use classifier::classify_bottlenecks;
pub use controller::{
    ControllerState, LoadTester, LoadTesterBuilder, LoadTesterOptions, ProgressCallback,
    RequestCallback,
};
pub use detector::detect_degradation;
pub use executor::{RequestExecutor, RunClock};
pub use planner::{plan_capacity, DEFAULT_SAFETY_MARGIN};
pub use progress::ProgressSnapshot;
pub use report::{format_report, to_json, write_report, ReportFormat};
pub use selector::ScenarioSelector;
pub use shape::users_at;
pub use simulated::SimulatedTarget;
