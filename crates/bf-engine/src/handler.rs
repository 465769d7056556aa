use async_trait::async_trait;
use bf_core::{Attempt, AttemptResult};

/// A protocol-specific authentication routine. A handler must:
/// honor `attempt.timeout` as a hard ceiling on its own work, never let a
/// panic escape across the call (recoverable faults become
/// `AttemptResult.error`), and be safe to invoke from many workers
/// concurrently with distinct attempts.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn execute(&self, attempt: &Attempt) -> AttemptResult;
}
