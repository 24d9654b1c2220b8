//! Concurrency controller: drives virtual users along the load pattern
//!
//! # Lifecycle
//!
//! ```text
//! Idle --run()--> Running --duration elapsed / cancel--> Stopping --drained--> Stopped
//! ```
//!
//! While running, a fixed-cadence tick recomputes the target user count from
//! the load pattern and spawns virtual users until the pool reaches it. The
//! pool shrinks cooperatively: each virtual user checks at the top of its
//! loop whether the pool is above target and retires if so. Completed
//! requests flow over a channel into a result list owned by the controller.
//! On stop the controller joins every virtual user and drains the channel
//! before reporting `Stopped`, so no result arrives after the run ends.

use crate::analysis::{analyze, AnalysisOptions};
use crate::executor::{RequestExecutor, RunClock};
use crate::progress::{ProgressSnapshot, RollingStats};
use crate::selector::ScenarioSelector;
use crate::shape::users_at;
use loadscope_core::metrics::{ACTIVE_VIRTUAL_USERS, TARGET_VIRTUAL_USERS};
use loadscope_core::{
    CoreError, CoreResult, DegradationThresholds, LoadPatternConfig, LoadScopeConfig, LoadTarget,
    LoadTestResults, RequestResult, ResolvedPattern, RunId, ScenarioTemplate, TestConfiguration,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Called every `progress_every` completed requests.
pub type ProgressCallback = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// Called once per completed request.
pub type RequestCallback = Arc<dyn Fn(&RequestResult) + Send + Sync>;

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Run-level tuning for a [`LoadTester`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadTesterOptions {
    /// Per-request timeout (default: 30s)
    pub timeout: Duration,
    /// Pause between requests of one virtual user (default: 1s)
    pub think_time: Duration,
    /// Cadence at which the target user count is recomputed (default: 1s)
    pub tick_interval: Duration,
    /// Aggregation window (default: 10s)
    pub window_size_ms: u64,
    /// Progress callback cadence in completed requests (default: 10)
    pub progress_every: usize,
    /// Requests covered by rolling progress statistics (default: 100)
    pub rolling_window: usize,
    pub thresholds: DegradationThresholds,
    /// Fraction held back from the measured capacity (default: 0.2)
    pub safety_margin: f64,
}

impl Default for LoadTesterOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            think_time: Duration::from_secs(1),
            tick_interval: Duration::from_secs(1),
            window_size_ms: 10_000,
            progress_every: 10,
            rolling_window: 100,
            thresholds: DegradationThresholds::default(),
            safety_margin: 0.2,
        }
    }
}

impl LoadTesterOptions {
    pub fn from_config(config: &LoadScopeConfig) -> Self {
        Self {
            timeout: config.run.timeout(),
            think_time: config.run.think_time(),
            tick_interval: config.run.tick_interval(),
            window_size_ms: config.run.window_size_ms,
            progress_every: config.run.progress_every,
            rolling_window: config.run.rolling_window,
            thresholds: config.thresholds,
            safety_margin: config.run.safety_margin,
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.timeout.is_zero() {
            return Err(CoreError::invalid_config("timeout must be greater than zero"));
        }
        if self.tick_interval.is_zero() {
            return Err(CoreError::invalid_config("tick interval must be greater than zero"));
        }
        if self.window_size_ms == 0 {
            return Err(CoreError::invalid_config("window size must be greater than zero"));
        }
        if !(0.0..1.0).contains(&self.safety_margin) {
            return Err(CoreError::invalid_config("safety margin must be within [0.0, 1.0)"));
        }
        self.thresholds
            .validate()
            .map_err(|e| CoreError::invalid_config(e.to_string()))?;
        Ok(())
    }
}

/// Builder for [`LoadTester`]
#[derive(Default)]
pub struct LoadTesterBuilder {
    target: Option<Arc<dyn LoadTarget>>,
    scenarios: Vec<ScenarioTemplate>,
    pattern: Option<LoadPatternConfig>,
    options: LoadTesterOptions,
    on_progress: Option<ProgressCallback>,
    on_request: Option<RequestCallback>,
}

impl LoadTesterBuilder {
    /// Take scenarios, load pattern and run options from a loaded config.
    pub fn config(mut self, config: &LoadScopeConfig) -> Self {
        self.scenarios = config.scenarios.clone();
        self.pattern = Some(config.load_pattern.clone());
        self.options = LoadTesterOptions::from_config(config);
        self
    }

    pub fn target(mut self, target: Arc<dyn LoadTarget>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn scenarios(mut self, scenarios: Vec<ScenarioTemplate>) -> Self {
        self.scenarios = scenarios;
        self
    }

    pub fn scenario(mut self, scenario: ScenarioTemplate) -> Self {
        self.scenarios.push(scenario);
        self
    }

    pub fn load_pattern(mut self, pattern: LoadPatternConfig) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn options(mut self, options: LoadTesterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn think_time(mut self, think_time: Duration) -> Self {
        self.options.think_time = think_time;
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(&ProgressSnapshot) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn on_request(mut self, callback: impl Fn(&RequestResult) + Send + Sync + 'static) -> Self {
        self.on_request = Some(Arc::new(callback));
        self
    }

    /// Validate everything and produce an idle tester.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the target or load pattern is missing,
    /// the scenario list is empty or badly weighted, or the pattern or
    /// options are out of range. No load is generated on error.
    pub fn build(self) -> CoreResult<LoadTester> {
        let target = self
            .target
            .ok_or_else(|| CoreError::invalid_config("missing target"))?;
        let pattern = self
            .pattern
            .ok_or_else(|| CoreError::invalid_config("missing load pattern"))?;
        pattern.validate()?;
        self.options.validate()?;
        let selector = ScenarioSelector::new(self.scenarios)?;

        Ok(LoadTester {
            run_id: RunId::new(),
            target,
            selector: Arc::new(selector),
            resolved: pattern.resolve(),
            pattern,
            options: self.options,
            on_progress: self.on_progress,
            on_request: self.on_request,
            state: RwLock::new(ControllerState::Idle),
            cancel: CancellationToken::new(),
        })
    }
}

/// Single-use load test runner
pub struct LoadTester {
    run_id: RunId,
    target: Arc<dyn LoadTarget>,
    selector: Arc<ScenarioSelector>,
    pattern: LoadPatternConfig,
    resolved: ResolvedPattern,
    options: LoadTesterOptions,
    on_progress: Option<ProgressCallback>,
    on_request: Option<RequestCallback>,
    state: RwLock<ControllerState>,
    cancel: CancellationToken,
}

impl LoadTester {
    pub fn builder() -> LoadTesterBuilder {
        LoadTesterBuilder::default()
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn state(&self) -> ControllerState {
        *self.state.read()
    }

    /// Token that ends the run early when cancelled.
    ///
    /// Cancellation is graceful: in-flight requests finish (or time out),
    /// every result is drained, and `run` still returns full results.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the load test and analyze the outcome.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if this tester has already been run.
    pub async fn run(&self) -> CoreResult<LoadTestResults> {
        {
            let mut state = self.state.write();
            if *state != ControllerState::Idle {
                return Err(CoreError::invalid_state(format!(
                    "load test already {:?}",
                    *state
                )));
            }
            *state = ControllerState::Running;
        }

        tracing::info!(
            run_id = %self.run_id,
            pattern = %self.pattern.description(),
            scenarios = self.selector.scenarios().len(),
            "Starting load test"
        );

        let clock = RunClock::start();
        let executor = RequestExecutor::new(Arc::clone(&self.target), self.options.timeout, clock);
        let pool = Arc::new(Pool::default());
        let stop = self.cancel.child_token();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut users = JoinSet::new();
        let mut recorder = Recorder::new(self, clock);

        let deadline = tokio::time::sleep(Duration::from_millis(self.pattern.duration_ms));
        tokio::pin!(deadline);
        let mut ticker = tokio::time::interval(self.options.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    tracing::info!(run_id = %self.run_id, "Load test cancelled");
                    break;
                }
                _ = &mut deadline => break,
                Some(result) = rx.recv() => recorder.record(result, &pool),
                _ = ticker.tick() => {
                    let target = users_at(&self.resolved, clock.elapsed());
                    pool.retarget(target);
                    let active = pool.active();
                    for _ in active..target {
                        let user = VirtualUser {
                            executor: executor.clone(),
                            selector: Arc::clone(&self.selector),
                            slot: Slot::claim(&pool),
                            stop: stop.clone(),
                            results: tx.clone(),
                            think_time: self.options.think_time,
                        };
                        users.spawn(user.run());
                    }
                    ACTIVE_VIRTUAL_USERS.set(pool.active() as i64);
                    tracing::debug!(
                        elapsed_ms = clock.elapsed().as_millis() as u64,
                        target,
                        active = pool.active(),
                        "Retargeted virtual users"
                    );
                }
            }
        }

        self.transition(ControllerState::Stopping);
        stop.cancel();
        drop(tx);

        while let Some(joined) = users.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(run_id = %self.run_id, error = %e, "Virtual user task failed");
            }
        }
        while let Some(result) = rx.recv().await {
            recorder.record(result, &pool);
        }
        ACTIVE_VIRTUAL_USERS.set(0);

        let elapsed = clock.elapsed();
        let end_time = clock.now();
        let requests = recorder.into_results();
        let analysis = analyze(
            &requests,
            Some(elapsed.as_secs_f64()),
            &AnalysisOptions {
                window_size_ms: self.options.window_size_ms,
                thresholds: self.options.thresholds,
                safety_margin: self.options.safety_margin,
                peak_users: self.pattern.peak_users,
            },
        );

        let results = LoadTestResults {
            run_id: self.run_id,
            configuration: TestConfiguration {
                load_pattern: self.pattern.clone(),
                scenarios: self.selector.scenarios().to_vec(),
                timeout_ms: self.options.timeout.as_millis() as u64,
                think_time_ms: self.options.think_time.as_millis() as u64,
                window_size_ms: self.options.window_size_ms,
            },
            start_time: clock.origin(),
            end_time,
            cancelled: self.cancel.is_cancelled(),
            overall: analysis.overall,
            windows: analysis.windows,
            requests,
            degradation_points: analysis.degradation_points,
            capacity: analysis.capacity,
        };

        self.transition(ControllerState::Stopped);
        tracing::info!(
            run_id = %self.run_id,
            duration_ms = elapsed.as_millis() as u64,
            total_requests = results.overall.total_requests,
            failed_requests = results.overall.failed_requests,
            degradation_points = results.degradation_points.len(),
            "Load test complete"
        );

        Ok(results)
    }

    fn transition(&self, next: ControllerState) {
        let mut state = self.state.write();
        let previous = *state;
        *state = next;
        tracing::debug!(run_id = %self.run_id, from = ?previous, to = ?next, "State transition");
    }
}

/// Active and target virtual-user counts shared with the virtual users.
#[derive(Debug, Default)]
struct Pool {
    active: AtomicUsize,
    target: AtomicUsize,
}

impl Pool {
    fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    fn target(&self) -> usize {
        self.target.load(Ordering::Acquire)
    }

    fn retarget(&self, target: usize) {
        self.target.store(target, Ordering::Release);
        TARGET_VIRTUAL_USERS.set(target as i64);
    }

    fn enlist(&self) {
        self.active.fetch_add(1, Ordering::AcqRel);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }

    /// Leave the pool if it is above target. Returns whether the caller left.
    fn try_retire(&self) -> bool {
        let mut active = self.active.load(Ordering::Acquire);
        loop {
            if active <= self.target() {
                return false;
            }
            match self.active.compare_exchange_weak(
                active,
                active - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(current) => active = current,
            }
        }
    }
}

/// A virtual user's place in the pool, given back when dropped.
///
/// Dropping also happens while a panicking task unwinds, so the active
/// count never keeps a dead user.
struct Slot {
    pool: Arc<Pool>,
    held: bool,
}

impl Slot {
    fn claim(pool: &Arc<Pool>) -> Self {
        pool.enlist();
        Self {
            pool: Arc::clone(pool),
            held: true,
        }
    }

    fn try_retire(&mut self) -> bool {
        if self.held && self.pool.try_retire() {
            self.held = false;
        }
        !self.held
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if self.held {
            self.pool.leave();
        }
    }
}

struct VirtualUser {
    executor: RequestExecutor,
    selector: Arc<ScenarioSelector>,
    slot: Slot,
    stop: CancellationToken,
    results: mpsc::UnboundedSender<RequestResult>,
    think_time: Duration,
}

impl VirtualUser {
    async fn run(mut self) {
        loop {
            if self.stop.is_cancelled() {
                break;
            }
            if self.slot.try_retire() {
                break;
            }

            let scenario = self.selector.select();
            let result = self.executor.execute(scenario, self.slot.pool.active()).await;
            if self.results.send(result).is_err() {
                break;
            }

            if self.think_time.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    _ = self.stop.cancelled() => break,
                    _ = tokio::time::sleep(self.think_time) => {}
                }
            }
        }
    }
}

/// Owns the result list and progress accounting for one run.
struct Recorder {
    results: Vec<RequestResult>,
    rolling: RollingStats,
    completed: usize,
    failed: usize,
    clock: RunClock,
    progress_every: usize,
    on_progress: Option<ProgressCallback>,
    on_request: Option<RequestCallback>,
}

impl Recorder {
    fn new(tester: &LoadTester, clock: RunClock) -> Self {
        Self {
            results: Vec::new(),
            rolling: RollingStats::new(tester.options.rolling_window),
            completed: 0,
            failed: 0,
            clock,
            progress_every: tester.options.progress_every,
            on_progress: tester.on_progress.clone(),
            on_request: tester.on_request.clone(),
        }
    }

    fn record(&mut self, result: RequestResult, pool: &Pool) {
        self.completed += 1;
        if !result.success {
            self.failed += 1;
        }
        self.rolling.push(&result);

        if let Some(callback) = &self.on_request {
            callback(&result);
        }
        self.results.push(result);

        if let Some(callback) = &self.on_progress {
            if self.progress_every > 0 && self.completed % self.progress_every == 0 {
                callback(&ProgressSnapshot {
                    elapsed: self.clock.elapsed(),
                    target_users: pool.target(),
                    active_users: pool.active(),
                    completed_requests: self.completed,
                    failed_requests: self.failed,
                    rolling_throughput: self.rolling.throughput(),
                    rolling_avg_latency_ms: self.rolling.avg_latency_ms(),
                });
            }
        }
    }

    fn into_results(self) -> Vec<RequestResult> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedTarget;
    use loadscope_core::{PatternKind, SimulatedTargetConfig};
    use parking_lot::Mutex;
    use serde_json::json;

    fn target(latency_ms: u64) -> Arc<dyn LoadTarget> {
        Arc::new(SimulatedTarget::new(SimulatedTargetConfig {
            base_latency_ms: latency_ms,
            ..SimulatedTargetConfig::default()
        }))
    }

    fn builder(pattern: LoadPatternConfig) -> LoadTesterBuilder {
        LoadTester::builder()
            .target(target(100))
            .scenario(ScenarioTemplate::new("ping", json!({})))
            .load_pattern(pattern)
            .options(LoadTesterOptions {
                think_time: Duration::ZERO,
                tick_interval: Duration::from_millis(100),
                ..LoadTesterOptions::default()
            })
    }

    #[test]
    fn test_build_requires_target() {
        let result = LoadTester::builder()
            .scenario(ScenarioTemplate::new("ping", json!({})))
            .load_pattern(LoadPatternConfig::new(PatternKind::Sustained, 0, 1, 1_000))
            .build();

        match result {
            Err(CoreError::InvalidConfig { message }) => assert_eq!(message, "missing target"),
            other => panic!("expected InvalidConfig, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_build_rejects_bad_inputs() {
        let pattern = LoadPatternConfig::new(PatternKind::Sustained, 0, 1, 1_000);

        let no_scenarios = LoadTester::builder()
            .target(target(1))
            .load_pattern(pattern.clone())
            .build();
        assert!(matches!(no_scenarios, Err(CoreError::InvalidConfig { .. })));

        let bad_pattern = builder(LoadPatternConfig::new(PatternKind::Sustained, 5, 1, 1_000)).build();
        assert!(matches!(bad_pattern, Err(CoreError::InvalidConfig { .. })));

        let bad_timeout = builder(pattern.clone()).timeout(Duration::ZERO).build();
        assert!(matches!(bad_timeout, Err(CoreError::InvalidConfig { .. })));

        let nan_threshold = builder(pattern)
            .options(LoadTesterOptions {
                thresholds: DegradationThresholds {
                    latency_factor: f64::NAN,
                    ..DegradationThresholds::default()
                },
                ..LoadTesterOptions::default()
            })
            .build();
        match nan_threshold {
            Err(CoreError::InvalidConfig { message }) => {
                assert!(message.contains("latency_factor"), "{message}")
            }
            other => panic!("expected InvalidConfig, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_slot_released_when_user_task_panics() {
        let pool = Arc::new(Pool::default());
        let slot = Slot::claim(&pool);
        assert_eq!(pool.active(), 1);

        let handle = tokio::spawn(async move {
            let _slot = slot;
            panic!("virtual user crashed");
        });

        assert!(handle.await.unwrap_err().is_panic());
        assert_eq!(pool.active(), 0);
    }

    #[test]
    fn test_retired_slot_is_not_released_twice() {
        let pool = Arc::new(Pool::default());
        let mut kept = Slot::claim(&pool);
        let mut extra = Slot::claim(&pool);
        pool.retarget(1);

        assert!(extra.try_retire());
        assert!(!kept.try_retire());
        drop(extra);
        assert_eq!(pool.active(), 1);
        drop(kept);
        assert_eq!(pool.active(), 0);
    }

    /// Panics on its first request, then behaves like a 100ms target.
    struct CrashOnce {
        calls: AtomicUsize,
        inner: SimulatedTarget,
    }

    #[async_trait::async_trait]
    impl LoadTarget for CrashOnce {
        async fn submit(
            &self,
            payload: &serde_json::Value,
        ) -> Result<loadscope_core::ResponseStream, loadscope_core::TargetError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("backend crashed");
            }
            self.inner.submit(payload).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_target_keeps_pool_accurate() {
        let crash = Arc::new(CrashOnce {
            calls: AtomicUsize::new(0),
            inner: SimulatedTarget::new(SimulatedTargetConfig {
                base_latency_ms: 100,
                ..SimulatedTargetConfig::default()
            }),
        });
        let tester = builder(LoadPatternConfig::new(PatternKind::Sustained, 0, 2, 2_000))
            .target(crash)
            .build()
            .unwrap();

        let results = tester.run().await.unwrap();

        let failed: Vec<_> = results.requests.iter().filter(|r| !r.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(
            failed[0].error.as_deref(),
            Some("request failed: target panicked: backend crashed")
        );
        // Both users keep issuing requests for the whole run
        let total = results.requests.len();
        assert!((39..=43).contains(&total), "total {total}");
        assert!(results.requests.iter().all(|r| r.concurrent_users == 2));
    }

    #[test]
    fn test_pool_retirement() {
        let pool = Pool::default();
        for _ in 0..3 {
            pool.enlist();
        }
        pool.retarget(1);

        assert!(pool.try_retire());
        assert!(pool.try_retire());
        assert!(!pool.try_retire());
        assert_eq!(pool.active(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_run_lifecycle() {
        let seen = Arc::new(AtomicUsize::new(0));
        let progress = Arc::new(Mutex::new(Vec::new()));

        let tester = {
            let seen = Arc::clone(&seen);
            let progress = Arc::clone(&progress);
            builder(LoadPatternConfig::new(PatternKind::Sustained, 0, 3, 1_000))
                .on_request(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                })
                .on_progress(move |snapshot| progress.lock().push(snapshot.clone()))
                .build()
                .unwrap()
        };
        assert_eq!(tester.state(), ControllerState::Idle);

        let results = tester.run().await.unwrap();

        assert_eq!(tester.state(), ControllerState::Stopped);
        assert!(!results.cancelled);
        // 3 users x 10 requests of 100ms, plus at most one straggler each
        let total = results.requests.len();
        assert!((30..=33).contains(&total), "total {total}");
        assert_eq!(seen.load(Ordering::SeqCst), total);
        assert!(results.requests.iter().all(|r| r.success));
        assert!(results.requests.iter().all(|r| r.concurrent_users <= 3));
        assert_eq!(results.overall.total_requests, total);

        let progress = progress.lock();
        assert_eq!(progress.len(), total / 10);
        assert_eq!(progress[0].completed_requests, 10);
        assert_eq!(progress[0].target_users, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_only_once() {
        let tester = builder(LoadPatternConfig::new(PatternKind::Sustained, 0, 1, 200))
            .build()
            .unwrap();

        tester.run().await.unwrap();
        assert!(matches!(
            tester.run().await,
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_follows_spike() {
        let mut pattern = LoadPatternConfig::new(PatternKind::Spike, 1, 4, 3_000);
        pattern.spike_interval_ms = Some(1_000);
        let tester = builder(pattern).build().unwrap();

        let results = tester.run().await.unwrap();

        let tags_between = |from: i64, to: i64| -> Vec<usize> {
            let origin = results.start_time.timestamp_millis();
            results
                .requests
                .iter()
                .filter(|r| (from..to).contains(&(r.start_ms() - origin)))
                .map(|r| r.concurrent_users)
                .collect()
        };

        assert!(tags_between(0, 1_000).iter().all(|&u| u == 1));
        assert!(tags_between(1_200, 2_000).iter().all(|&u| u == 4));
        let after_spike = tags_between(2_200, 3_000);
        assert!(!after_spike.is_empty());
        assert!(after_spike.iter().all(|&u| u == 1), "{after_spike:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_run() {
        let tester = builder(LoadPatternConfig::new(PatternKind::Sustained, 0, 2, 60_000))
            .build()
            .unwrap();
        tester.cancel_token().cancel();

        let results = tester.run().await.unwrap();
        assert!(results.cancelled);
        assert!(results.requests.is_empty());
        assert_eq!(tester.state(), ControllerState::Stopped);
    }
}
