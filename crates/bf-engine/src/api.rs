//! Public, serializable types for observing a running engine: the event
//! stream, the attempt-outcome projection carried on it, and the
//! `EngineHandle` wrapper used by the one-shot convenience entry points.

use serde::{Deserialize, Serialize};

use bf_core::{AttemptResult, Target};

/// A serializable projection of [`bf_core::AttemptResult`]. The full
/// result carries the originating `Attempt`, which holds a
/// `CancellationToken` and isn't itself serializable; this is what flows
/// out over the event stream and to the result callback's observers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttemptOutcome {
    pub target: Target,
    pub username: String,
    pub password: String,
    pub success: bool,
    pub error: Option<String>,
    pub response_time_ms: u64,
    pub banner: Option<String>,
    pub finished: bool,
    pub user_eliminated: bool,
}

impl From<&AttemptResult> for AttemptOutcome {
    fn from(result: &AttemptResult) -> Self {
        Self {
            target: result.attempt.target.clone(),
            username: result.attempt.username.clone(),
            password: result.attempt.password.clone(),
            success: result.success,
            error: result.error.clone(),
            response_time_ms: result.response_time.as_millis() as u64,
            banner: result.banner.clone(),
            finished: result.finished,
            user_eliminated: result.user_eliminated,
        }
    }
}

/// Snapshot of concurrency-slot usage, returned by `Engine::concurrency_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConcurrencyStatus {
    pub global_used: usize,
    pub global_total: usize,
    pub target_used: usize,
    pub target_total: usize,
}

/// Final tallies emitted once `start()` finishes draining (or is
/// cancelled).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FinalStats {
    pub total: u64,
    pub processed: u64,
    pub success: u64,
    pub failed: u64,
}

/// Engine event stream payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// `start()` began draining targets.
    Started,
    /// One attempt completed.
    AttemptCompleted { outcome: AttemptOutcome },
    /// A target's `finished` flag was set (success with `OkToStop`, a
    /// handler-reported terminal failure, or `finished=true` on a result).
    TargetFinished { target: Target },
    /// Periodic progress line, when `ShowProgress` is enabled.
    Progress { line: String },
    /// A non-fatal engine-level warning (e.g. "no targets registered").
    Warning { message: String },
    /// A non-fatal engine-level error.
    Error { message: String },
    /// `start()` returned; no more events will follow on this stream.
    Stopped { stats: FinalStats },
}
