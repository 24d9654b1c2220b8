//! Single-request execution with a timeout bound

use chrono::{DateTime, Utc};
use futures::{FutureExt, StreamExt};
use loadscope_core::metrics::{REQUESTS_TOTAL, REQUEST_DURATION};
use loadscope_core::{timeout_error, LoadTarget, RequestResult, ScenarioTemplate, TargetError};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Wall-clock anchor for a run.
///
/// Timestamps are derived from the tokio clock so that latencies and
/// timestamps stay consistent with each other, including under a paused
/// test clock.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    origin_utc: DateTime<Utc>,
    origin: Instant,
}

impl RunClock {
    /// Anchor a clock at the current instant.
    pub fn start() -> Self {
        Self {
            origin_utc: Utc::now(),
            origin: Instant::now(),
        }
    }

    pub fn origin(&self) -> DateTime<Utc> {
        self.origin_utc
    }

    /// Time elapsed since the clock was anchored.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Current wall-clock time.
    pub fn now(&self) -> DateTime<Utc> {
        self.at(Instant::now())
    }

    fn at(&self, instant: Instant) -> DateTime<Utc> {
        let offset = instant.saturating_duration_since(self.origin);
        self.origin_utc + chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

/// Runs one request against the target and normalizes the outcome.
#[derive(Clone)]
pub struct RequestExecutor {
    target: Arc<dyn LoadTarget>,
    timeout: Duration,
    clock: RunClock,
}

impl RequestExecutor {
    pub fn new(target: Arc<dyn LoadTarget>, timeout: Duration, clock: RunClock) -> Self {
        Self {
            target,
            timeout,
            clock,
        }
    }

    /// Execute `scenario`, tagging the result with `concurrent_users`.
    ///
    /// Never fails: target errors and timeouts are recorded on the returned
    /// [`RequestResult`]. On timeout the in-flight request future is dropped
    /// and whatever it would have produced is discarded. A target that panics
    /// is recorded as a failed request.
    pub async fn execute(&self, scenario: &ScenarioTemplate, concurrent_users: usize) -> RequestResult {
        let start = Instant::now();
        let outcome = tokio::time::timeout(
            self.timeout,
            AssertUnwindSafe(drive(self.target.as_ref(), &scenario.payload)).catch_unwind(),
        )
        .await;
        let end = Instant::now();
        let latency = end.saturating_duration_since(start);

        let (success, error, response_size) = match outcome {
            Ok(Ok(Ok(size))) => (true, None, size),
            Ok(Ok(Err(e))) => (false, Some(e.to_string()), None),
            Ok(Err(panic)) => {
                let error = TargetError::Failed(format!("target panicked: {}", panic_message(&*panic)));
                (false, Some(error.to_string()), None)
            }
            Err(_) => (false, Some(timeout_error(self.timeout.as_millis() as u64)), None),
        };

        let status = if success { "success" } else { "failure" };
        REQUESTS_TOTAL
            .with_label_values(&[scenario.name.as_str(), status])
            .inc();
        REQUEST_DURATION
            .with_label_values(&[scenario.name.as_str()])
            .observe(latency.as_secs_f64());

        if let Some(error) = &error {
            tracing::debug!(
                scenario = %scenario.name,
                concurrent_users,
                error = %error,
                "Request failed"
            );
        }

        RequestResult {
            scenario: scenario.name.clone(),
            started_at: self.clock.at(start),
            ended_at: self.clock.at(end),
            latency_ms: latency.as_secs_f64() * 1000.0,
            success,
            error,
            concurrent_users,
            response_size,
        }
    }
}

/// Submit the payload and consume the response stream, summing chunk sizes.
async fn drive(
    target: &dyn LoadTarget,
    payload: &serde_json::Value,
) -> Result<Option<u64>, TargetError> {
    let mut stream = target.submit(payload).await?;
    let mut size: Option<u64> = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        *size.get_or_insert(0) += chunk.len() as u64;
    }

    Ok(size)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
