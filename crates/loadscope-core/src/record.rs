use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single request issued by a virtual user.
///
/// Every execution produces exactly one record, whether the target succeeded,
/// failed, or timed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
    /// Name of the scenario that produced the request.
    pub scenario: String,
    /// Wall-clock time the request was issued.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time the request settled.
    pub ended_at: DateTime<Utc>,
    /// Measured latency in milliseconds.
    pub latency_ms: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Active virtual users when the request was issued.
    pub concurrent_users: usize,
    /// Bytes streamed back by the target, if it streamed anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_size: Option<u64>,
}

impl RequestResult {
    /// Start time in milliseconds since the Unix epoch.
    #[must_use]
    pub fn start_ms(&self) -> i64 {
        self.started_at.timestamp_millis()
    }

    /// Whether this failure was caused by the executor's timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|e| e.starts_with(TIMEOUT_ERROR_PREFIX))
    }
}

/// Leading text of every timeout error string.
pub const TIMEOUT_ERROR_PREFIX: &str = "request timed out after";

/// Build the error string recorded for a timed-out request.
#[must_use]
pub fn timeout_error(timeout_ms: u64) -> String {
    format!("{TIMEOUT_ERROR_PREFIX} {timeout_ms}ms")
}
