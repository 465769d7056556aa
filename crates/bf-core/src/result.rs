use std::collections::HashMap;
use std::time::Duration;

use crate::Attempt;

/// Outcome of one attempt.
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub attempt: Attempt,
    pub success: bool,
    /// Present when `success` is false and the handler distinguishes the
    /// failure (transport, auth-refused, timeout, ...).
    pub error: Option<String>,
    /// Measured end-to-end by the engine, not the handler.
    pub response_time: Duration,
    /// Handler-supplied human summary, e.g. a banner or server version.
    pub banner: Option<String>,
    /// Handler hint that further attempts against this target should stop
    /// even on failure (connection refused, port closed, ...).
    pub finished: bool,
    /// Handler hint that this username should not be retried on this
    /// target. Wired by the engine's dispatcher (see the engine crate).
    pub user_eliminated: bool,
    pub extra: HashMap<String, String>,
}

impl AttemptResult {
    /// A successful result with no banner or extra info.
    pub fn success(attempt: Attempt, response_time: Duration) -> Self {
        Self {
            attempt,
            success: true,
            error: None,
            response_time,
            banner: None,
            finished: false,
            user_eliminated: false,
            extra: HashMap::new(),
        }
    }

    /// A failed result carrying `error`.
    pub fn failure(attempt: Attempt, response_time: Duration, error: impl Into<String>) -> Self {
        Self {
            attempt,
            success: false,
            error: Some(error.into()),
            response_time,
            banner: None,
            finished: false,
            user_eliminated: false,
            extra: HashMap::new(),
        }
    }

    /// Like [`AttemptResult::failure`] but also marks the target `finished`.
    pub fn terminal_failure(
        attempt: Attempt,
        response_time: Duration,
        error: impl Into<String>,
    ) -> Self {
        let mut result = Self::failure(attempt, response_time, error);
        result.finished = true;
        result
    }
}
