use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, watch, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use bf_core::{Attempt, AttemptResult, EngineError, Target};

use crate::api::{AttemptOutcome, ConcurrencyStatus, EngineEvent, FinalStats};
use crate::config::EngineConfig;
use crate::limiter::{RateLimitStatus, RateLimiter};
use crate::progress::{tick_interval, ProgressSample};
use crate::registry::HandlerRegistry;
use crate::target::TargetProcess;

/// Extra slack added to a handler's own `attempt.timeout`, per the
/// engine-side upper bound called for when a handler fails to respect its
/// deadline on its own.
const TIMEOUT_MARGIN: Duration = Duration::from_millis(500);

pub(crate) struct EngineInner {
    config: EngineConfig,
    registry: Arc<HandlerRegistry>,
    limiter: RateLimiter,
    global_slots: Arc<Semaphore>,
    cancel: CancellationToken,

    targets: RwLock<HashMap<Target, Arc<TargetProcess>>>,
    target_order: Mutex<Vec<Target>>,

    total_items: AtomicU64,
    processed_items: AtomicU64,
    success_items: AtomicU64,
    failed_items: AtomicU64,

    result_callback: RwLock<Option<Arc<dyn Fn(AttemptResult) + Send + Sync>>>,
    event_tx: broadcast::Sender<EngineEvent>,

    start_time: Mutex<Option<Instant>>,
    progress_interval: Mutex<Option<Duration>>,

    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

impl EngineInner {
    fn target_process(&self, target: &Target) -> Option<Arc<TargetProcess>> {
        self.targets.read().get(target).cloned()
    }
}

/// Owns configuration, targets, the limiter, the global concurrency
/// semaphore, progress counters, the cancellation token, and the result
/// callback. Drives all workers.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Validates `config`, loads dictionaries referenced by file (merging,
    /// not deduplicating — deduplication is the Builder's job), and
    /// constructs the limiter and the global semaphore of capacity
    /// `target_concurrent`.
    pub fn new(
        parent_cancel: CancellationToken,
        mut config: EngineConfig,
        registry: Arc<HandlerRegistry>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        if let Some(path) = config.user_dict_file.take() {
            config.user_dict.extend(bf_core::load_dictionary_file(path)?);
        }
        if let Some(path) = config.pass_dict_file.take() {
            config.pass_dict.extend(bf_core::load_dictionary_file(path)?);
        }

        let limiter = RateLimiter::new(config.min_delay, config.target_concurrent as u32);
        let global_slots = Arc::new(Semaphore::new(config.target_concurrent));
        let (event_tx, _) = broadcast::channel(1024);
        let (done_tx, done_rx) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                registry,
                limiter,
                global_slots,
                cancel: parent_cancel.child_token(),
                targets: RwLock::new(HashMap::new()),
                target_order: Mutex::new(Vec::new()),
                total_items: AtomicU64::new(0),
                processed_items: AtomicU64::new(0),
                success_items: AtomicU64::new(0),
                failed_items: AtomicU64::new(0),
                result_callback: RwLock::new(None),
                event_tx,
                start_time: Mutex::new(None),
                progress_interval: Mutex::new(None),
                done_tx,
                done_rx,
            }),
        })
    }

    /// Registers a target, allocating its target process with its own
    /// semaphore. Idempotent per (protocol, host, port) identity.
    pub fn add_target(&self, protocol: &str, host: &str, port: u16) -> Result<(), EngineError> {
        let protocol = protocol.to_ascii_lowercase();
        if !bf_core::is_recognized_protocol(&protocol) {
            return Err(EngineError::ConfigInvalid(format!(
                "unrecognized protocol tag {protocol:?}"
            )));
        }

        let target = Target::new(protocol, host, port);
        let mut targets = self.inner.targets.write();
        if !targets.contains_key(&target) {
            targets.insert(
                target.clone(),
                Arc::new(TargetProcess::new(target.clone(), self.inner.config.task_concurrent)),
            );
            self.inner.target_order.lock().push(target);
        }
        Ok(())
    }

    /// Appends to the target process named by the attempt's target;
    /// atomically increments `total_items`.
    pub fn feed(&self, attempt: Attempt) -> Result<(), EngineError> {
        let process = self
            .inner
            .target_process(&attempt.target)
            .ok_or_else(|| EngineError::UnknownTarget(attempt.target.clone()))?;
        process.append(attempt);
        self.inner.total_items.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Installs a result sink invoked once per completed attempt, in
    /// worker context. May be invoked concurrently; the sink must
    /// synchronize if it needs to.
    pub fn set_result_callback(&self, callback: Arc<dyn Fn(AttemptResult) + Send + Sync>) {
        *self.inner.result_callback.write() = Some(callback);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn target_count(&self) -> usize {
        self.inner.targets.read().len()
    }

    pub fn processed_count(&self) -> u64 {
        self.inner.processed_items.load(Ordering::Relaxed)
    }

    pub fn update_rate_limit(&self, min_delay: Duration, burst: u32) {
        self.inner.limiter.update(min_delay, burst);
    }

    /// Current rate-limit parameters: `min_delay`, `burst`, and whether the
    /// limiter is presently disabled (`min_delay == 0`).
    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.inner.limiter.status()
    }

    /// Current concurrency-slot usage: attempts in flight globally and
    /// aggregated across all per-target slots, against their configured
    /// totals.
    pub fn concurrency_status(&self) -> ConcurrencyStatus {
        let global_total = self.inner.config.target_concurrent;
        let global_used = global_total.saturating_sub(self.inner.global_slots.available_permits());
        let target_total = self.inner.config.task_concurrent * self.target_count();
        let target_used = self
            .inner
            .targets
            .read()
            .values()
            .map(|t| self.inner.config.task_concurrent - t.slot().available_permits())
            .sum();

        ConcurrencyStatus {
            global_used,
            global_total,
            target_used,
            target_total,
        }
    }

    pub fn set_progress_interval(&self, interval: Duration) {
        *self.inner.progress_interval.lock() = Some(interval);
    }

    pub fn progress_stats(&self) -> ProgressSample {
        let elapsed = (*self.inner.start_time.lock())
            .map(|t| t.elapsed())
            .unwrap_or_default();
        let concurrency = self.concurrency_status();

        ProgressSample {
            total: self.inner.total_items.load(Ordering::Relaxed),
            processed: self.inner.processed_items.load(Ordering::Relaxed),
            success: self.inner.success_items.load(Ordering::Relaxed),
            failed: self.inner.failed_items.load(Ordering::Relaxed),
            elapsed,
            global_used: concurrency.global_used,
            global_total: concurrency.global_total,
            target_used: concurrency.target_used,
            target_total: concurrency.target_total,
        }
    }

    /// Requests cancellation and waits for `start()` to observe it and
    /// return.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        let mut done_rx = self.inner.done_rx.clone();
        while !*done_rx.borrow() {
            if done_rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Blocks until all targets' queues drain or cancellation fires.
    pub async fn start(&self) -> Result<(), EngineError> {
        let inner = &self.inner;
        let targets: Vec<Arc<TargetProcess>> = {
            let order = inner.target_order.lock();
            let map = inner.targets.read();
            order
                .iter()
                .filter_map(|t| map.get(t).cloned())
                .collect()
        };

        if targets.is_empty() {
            let _ = inner.event_tx.send(EngineEvent::Warning {
                message: "start() called with no registered targets".to_string(),
            });
            let _ = inner.done_tx.send(true);
            return Ok(());
        }

        *inner.start_time.lock() = Some(Instant::now());
        let _ = inner.event_tx.send(EngineEvent::Started);

        let progress_cancel = CancellationToken::new();
        let progress_handle = if inner.config.show_progress {
            let configured_interval = *inner.progress_interval.lock();
            let interval = configured_interval
                .unwrap_or_else(|| tick_interval(inner.total_items.load(Ordering::Relaxed)));
            Some(tokio::spawn(run_progress_task(
                self.clone(),
                interval,
                progress_cancel.clone(),
            )))
        } else {
            None
        };

        let mut dispatchers = JoinSet::new();
        for target in targets {
            let engine = self.clone();
            dispatchers.spawn(async move { engine.run_target_dispatcher(target).await });
        }
        while dispatchers.join_next().await.is_some() {}

        progress_cancel.cancel();
        if let Some(handle) = progress_handle {
            let _ = handle.await;
        }

        let stats = FinalStats {
            total: inner.total_items.load(Ordering::Relaxed),
            processed: inner.processed_items.load(Ordering::Relaxed),
            success: inner.success_items.load(Ordering::Relaxed),
            failed: inner.failed_items.load(Ordering::Relaxed),
        };
        let _ = inner.event_tx.send(EngineEvent::Stopped { stats });
        let _ = inner.done_tx.send(true);
        Ok(())
    }

    async fn run_target_dispatcher(&self, target: Arc<TargetProcess>) {
        let inner = self.inner.clone();
        let pending = target.snapshot_pending();
        let mut workers = JoinSet::new();

        for attempt in pending {
            if inner.cancel.is_cancelled() {
                break;
            }
            if target.is_finished() {
                break;
            }
            if target.is_user_eliminated(&attempt.username) {
                continue;
            }

            let Some(global_permit) = acquire_cancellable(inner.global_slots.clone(), &inner.cancel).await
            else {
                break;
            };
            let Some(target_permit) = acquire_cancellable(target.slot(), &inner.cancel).await else {
                drop(global_permit);
                break;
            };

            let engine = self.clone();
            let target = target.clone();
            workers.spawn(async move {
                engine
                    .run_attempt_worker(target, attempt, global_permit, target_permit)
                    .await;
            });
        }

        while workers.join_next().await.is_some() {}
    }

    async fn run_attempt_worker(
        &self,
        target: Arc<TargetProcess>,
        attempt: Attempt,
        _global_permit: tokio::sync::OwnedSemaphorePermit,
        _target_permit: tokio::sync::OwnedSemaphorePermit,
    ) {
        let inner = &self.inner;
        if inner.limiter.acquire(&inner.cancel).await.is_err() {
            return;
        }

        let t0 = Instant::now();
        let mut result = self.execute(&attempt).await;
        result.response_time = t0.elapsed();

        inner.processed_items.fetch_add(1, Ordering::Relaxed);
        if result.success {
            inner.success_items.fetch_add(1, Ordering::Relaxed);
        } else {
            inner.failed_items.fetch_add(1, Ordering::Relaxed);
        }
        target.increment_completed();

        if let Some(callback) = inner.result_callback.read().clone() {
            callback(result.clone());
        }
        let _ = inner.event_tx.send(EngineEvent::AttemptCompleted {
            outcome: AttemptOutcome::from(&result),
        });

        if result.user_eliminated {
            target.eliminate_user(&result.attempt.username);
        }
        if result.finished || (result.success && inner.config.ok_to_stop) {
            target.mark_finished();
            let _ = inner.event_tx.send(EngineEvent::TargetFinished {
                target: target.target.clone(),
            });
        }
    }

    /// If `custom_callback` is set, returns its result directly; otherwise
    /// looks up the handler in the registry by protocol tag, failing with
    /// `UnsupportedProtocol` if none is registered.
    async fn execute(&self, attempt: &Attempt) -> AttemptResult {
        let deadline = attempt.timeout + TIMEOUT_MARGIN;
        let inner = self.inner.clone();
        let attempt = attempt.clone();

        let call = async move {
            if let Some(callback) = &inner.config.custom_callback {
                return callback.execute(&attempt).await;
            }
            match inner.registry.lookup(&attempt.target.protocol) {
                Some(handler) => handler.execute(&attempt).await,
                None => AttemptResult::failure(
                    attempt.clone(),
                    Duration::ZERO,
                    EngineError::UnsupportedProtocol(attempt.target.protocol.clone()).to_string(),
                ),
            }
        };

        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                AttemptResult::failure(attempt.clone(), deadline, "handler exceeded its timeout")
            }
        }
    }
}

async fn acquire_cancellable(
    semaphore: Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Option<tokio::sync::OwnedSemaphorePermit> {
    tokio::select! {
        permit = semaphore.acquire_owned() => permit.ok(),
        _ = cancel.cancelled() => None,
    }
}

async fn run_progress_task(engine: Engine, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let line = engine.progress_stats().render();
                let _ = engine.inner.event_tx.send(EngineEvent::Progress { line });
            }
            _ = cancel.cancelled() => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use crate::handler::Handler;

    /// Tracks how many calls are concurrently inside `execute` at once, via
    /// `max_seen`, then sleeps `delay` (a virtual sleep under
    /// `start_paused`) before succeeding.
    struct CountingHandler {
        delay: Duration,
        current: Arc<AtomicUsize>,
        max_seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Handler for CountingHandler {
        async fn execute(&self, attempt: &Attempt) -> AttemptResult {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            AttemptResult::success(attempt.clone(), Duration::ZERO)
        }
    }

    /// Succeeds only for one scripted username; fails every other one.
    struct ScriptedHandler {
        succeed_username: String,
    }

    #[async_trait]
    impl Handler for ScriptedHandler {
        async fn execute(&self, attempt: &Attempt) -> AttemptResult {
            if attempt.username == self.succeed_username {
                AttemptResult::success(attempt.clone(), Duration::ZERO)
            } else {
                AttemptResult::failure(attempt.clone(), Duration::ZERO, "bad credential")
            }
        }
    }

    fn attempt(target: &Target, user: &str, pass: &str) -> Attempt {
        Attempt::new(
            target.clone(),
            user,
            pass,
            Duration::from_secs(5),
            CancellationToken::new(),
        )
    }

    fn base_config() -> EngineConfig {
        EngineConfig {
            min_delay: Duration::ZERO,
            ..EngineConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn respects_per_target_concurrency_cap() {
        let registry = Arc::new(HandlerRegistry::new());
        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        registry.register(
            "ssh",
            Arc::new(CountingHandler {
                delay: Duration::from_millis(50),
                current: current.clone(),
                max_seen: max_seen.clone(),
            }),
        );

        let mut config = base_config();
        config.target_concurrent = 20;
        config.task_concurrent = 2;
        let engine = Engine::new(CancellationToken::new(), config, registry).unwrap();
        engine.add_target("ssh", "host", 22).unwrap();
        let target = Target::new("ssh", "host", 22);
        for i in 0..10 {
            engine.feed(attempt(&target, &format!("u{i}"), "p")).unwrap();
        }

        engine.start().await.unwrap();
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
        assert_eq!(engine.processed_count(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn respects_global_concurrency_cap_across_targets() {
        let registry = Arc::new(HandlerRegistry::new());
        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        registry.register(
            "ssh",
            Arc::new(CountingHandler {
                delay: Duration::from_millis(50),
                current: current.clone(),
                max_seen: max_seen.clone(),
            }),
        );

        let mut config = base_config();
        config.target_concurrent = 3;
        config.task_concurrent = 10;
        let engine = Engine::new(CancellationToken::new(), config, registry).unwrap();
        for t in 0..5 {
            engine.add_target("ssh", &format!("host{t}"), 22).unwrap();
        }
        for t in 0..5 {
            let target = Target::new("ssh", format!("host{t}"), 22);
            for i in 0..4 {
                engine.feed(attempt(&target, &format!("u{i}"), "p")).unwrap();
            }
        }

        engine.start().await.unwrap();
        assert!(max_seen.load(Ordering::SeqCst) <= 3);
        assert_eq!(engine.processed_count(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn all_fed_attempts_are_eventually_processed() {
        let registry = Arc::new(HandlerRegistry::new());
        registry.register(
            "ssh",
            Arc::new(CountingHandler {
                delay: Duration::from_millis(5),
                current: Arc::new(AtomicUsize::new(0)),
                max_seen: Arc::new(AtomicUsize::new(0)),
            }),
        );

        let mut config = base_config();
        config.target_concurrent = 4;
        config.task_concurrent = 4;
        let engine = Engine::new(CancellationToken::new(), config, registry).unwrap();
        engine.add_target("ssh", "host", 22).unwrap();
        let target = Target::new("ssh", "host", 22);
        for i in 0..15 {
            engine.feed(attempt(&target, &format!("u{i}"), "p")).unwrap();
        }

        engine.start().await.unwrap();
        let stats = engine.progress_stats();
        assert_eq!(stats.processed, 15);
        assert_eq!(stats.success, 15);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ok_to_stop_bounds_attempts_after_first_success() {
        let registry = Arc::new(HandlerRegistry::new());
        registry.register(
            "ssh",
            Arc::new(ScriptedHandler {
                succeed_username: "u0".to_string(),
            }),
        );

        let mut config = base_config();
        config.target_concurrent = 1;
        config.task_concurrent = 1;
        config.ok_to_stop = true;
        let engine = Engine::new(CancellationToken::new(), config, registry).unwrap();
        engine.add_target("ssh", "host", 22).unwrap();
        let target = Target::new("ssh", "host", 22);
        for i in 0..5 {
            engine.feed(attempt(&target, &format!("u{i}"), "p")).unwrap();
        }

        engine.start().await.unwrap();
        let stats = engine.progress_stats();
        assert_eq!(stats.success, 1);
        assert!(
            stats.processed < 5,
            "expected ok_to_stop to bound attempts below the full feed, got {}",
            stats.processed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_returns_promptly_and_leaves_attempts_unprocessed() {
        let registry = Arc::new(HandlerRegistry::new());
        registry.register(
            "ssh",
            Arc::new(CountingHandler {
                delay: Duration::from_millis(20),
                current: Arc::new(AtomicUsize::new(0)),
                max_seen: Arc::new(AtomicUsize::new(0)),
            }),
        );

        let mut config = base_config();
        config.target_concurrent = 1;
        config.task_concurrent = 1;
        let engine = Engine::new(CancellationToken::new(), config, registry).unwrap();
        engine.add_target("ssh", "host", 22).unwrap();
        let target = Target::new("ssh", "host", 22);
        for i in 0..50 {
            engine.feed(attempt(&target, &format!("u{i}"), "p")).unwrap();
        }

        let run_engine = engine.clone();
        let handle = tokio::spawn(async move { run_engine.start().await });

        tokio::time::sleep(Duration::from_millis(45)).await;
        tokio::time::timeout(Duration::from_secs(1), engine.stop())
            .await
            .expect("stop() did not return promptly");

        handle.await.unwrap().unwrap();
        assert!(engine.processed_count() < 50);
    }

    #[test]
    fn feed_against_unregistered_target_is_unknown_target_and_leaves_counters_unchanged() {
        let registry = Arc::new(HandlerRegistry::new());
        let engine = Engine::new(CancellationToken::new(), base_config(), registry).unwrap();
        let target = Target::new("ssh", "host", 22);

        let err = engine.feed(attempt(&target, "u", "p")).unwrap_err();
        assert!(matches!(err, EngineError::UnknownTarget(_)));
        assert_eq!(engine.progress_stats().total, 0);
    }
}
