//! Core domain types and traits for LoadScope load generation and analysis.

pub mod config;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod pattern;
pub mod record;
pub mod results;
pub mod scenario;
pub mod traits;

pub use config::{
    DegradationThresholds, LoadScopeConfig, LoggingConfig, RunConfig, SimulatedTargetConfig,
};
pub use error::{CoreError, CoreResult, TargetError};
pub use ids::RunId;
pub use pattern::{LoadPatternConfig, PatternKind, ResolvedPattern};
pub use record::{timeout_error, RequestResult, TIMEOUT_ERROR_PREFIX};
pub use results::{
    Bottleneck, BottleneckKind, CapacityRecommendations, DegradationPoint, LoadTestResults,
    MetricKind, OverallMetrics, TestConfiguration, TimeWindowMetrics,
};
pub use scenario::{validate_scenarios, ScenarioTemplate};
pub use traits::{LoadTarget, ResponseStream};
