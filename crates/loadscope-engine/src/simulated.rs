//! In-process target with a configurable load response
//!
//! Useful for dry runs and tests: latency grows with the number of requests
//! in flight past a knee, requests fail at a fixed probability, and the
//! target sheds load once a capacity is exceeded.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use loadscope_core::{LoadTarget, ResponseStream, SimulatedTargetConfig, TargetError};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct SimulatedTarget {
    config: SimulatedTargetConfig,
    in_flight: Arc<AtomicUsize>,
}

impl SimulatedTarget {
    pub fn new(mut config: SimulatedTargetConfig) -> Self {
        config.error_rate = if config.error_rate.is_finite() {
            config.error_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            config,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Requests currently being served.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Service time for a request arriving with `in_flight` requests active
    /// (itself included).
    pub fn latency_for(&self, in_flight: usize) -> Duration {
        let over_knee = in_flight.saturating_sub(self.config.knee_users) as u64;
        Duration::from_millis(
            self.config
                .base_latency_ms
                .saturating_add(self.config.latency_per_user_ms.saturating_mul(over_knee)),
        )
    }

    fn response(&self) -> ResponseStream {
        let chunk = Bytes::from(vec![b'.'; self.config.chunk_bytes]);
        futures::stream::iter((0..self.config.chunk_count).map(move |_| Ok(chunk.clone()))).boxed()
    }
}

impl Default for SimulatedTarget {
    fn default() -> Self {
        Self::new(SimulatedTargetConfig::default())
    }
}

/// Decrements the in-flight count when the request completes or is dropped.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[async_trait]
impl LoadTarget for SimulatedTarget {
    async fn submit(&self, _payload: &serde_json::Value) -> Result<ResponseStream, TargetError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        if let Some(capacity) = self.config.capacity_users {
            if in_flight > capacity {
                return Err(TargetError::Overloaded(format!(
                    "{} requests in flight exceeds capacity of {}",
                    in_flight, capacity
                )));
            }
        }

        let fail = self.config.error_rate > 0.0
            && rand::thread_rng().gen_bool(self.config.error_rate);

        tokio::time::sleep(self.latency_for(in_flight)).await;

        if fail {
            return Err(TargetError::Failed("simulated failure".to_string()));
        }
        Ok(self.response())
    }
}
