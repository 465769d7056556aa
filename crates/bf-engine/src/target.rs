use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use bf_core::{Attempt, Target};

/// Per-target mutable state: the target's identity, its pending attempts,
/// a completed-count, the terminal `finished` flag, and a semaphore
/// bounding in-flight attempts against this target to `task_concurrent`.
///
/// Pending attempts are append-only before `start()` and read-only during
/// the run, so the dispatcher snapshots them once rather than holding the
/// lock across the run. `finished` is an atomic bool rather than the
/// source's read/write lock — acceptable per the design notes, since
/// `Ordering::SeqCst` preserves the visibility the source's lock gave.
pub struct TargetProcess {
    pub target: Target,
    pending: Mutex<Vec<Attempt>>,
    completed: AtomicU64,
    finished: AtomicBool,
    eliminated_users: Mutex<HashSet<String>>,
    slot: Arc<Semaphore>,
}

impl TargetProcess {
    pub fn new(target: Target, task_concurrent: usize) -> Self {
        Self {
            target,
            pending: Mutex::new(Vec::new()),
            completed: AtomicU64::new(0),
            finished: AtomicBool::new(false),
            eliminated_users: Mutex::new(HashSet::new()),
            slot: Arc::new(Semaphore::new(task_concurrent.max(1))),
        }
    }

    /// O(1), synchronized.
    pub fn append(&self, attempt: Attempt) {
        self.pending.lock().push(attempt);
    }

    /// A copy of the pending attempts, in insertion order. Taken once by
    /// the target dispatcher at the start of its run.
    pub fn snapshot_pending(&self) -> Vec<Attempt> {
        self.pending.lock().clone()
    }

    /// Sets the terminal flag; observable to the dispatcher loop before it
    /// launches its next attempt. Already-running attempts are not
    /// cancelled.
    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn completed_count(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn slot(&self) -> Arc<Semaphore> {
        self.slot.clone()
    }

    /// Marks `username` so future pending attempts against this target for
    /// that user are skipped by the dispatcher. This is the wiring decision
    /// for `user_eliminated` recorded in the project's design notes.
    pub fn eliminate_user(&self, username: &str) {
        self.eliminated_users.lock().insert(username.to_string());
    }

    pub fn is_user_eliminated(&self, username: &str) -> bool {
        self.eliminated_users.lock().contains(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn attempt(user: &str) -> Attempt {
        Attempt::new(
            Target::new("ssh", "127.0.0.1", 22),
            user,
            "pw",
            Duration::from_secs(1),
            CancellationToken::new(),
        )
    }

    #[test]
    fn append_and_snapshot_preserve_order() {
        let process = TargetProcess::new(Target::new("ssh", "127.0.0.1", 22), 4);
        process.append(attempt("a"));
        process.append(attempt("b"));
        let pending = process.snapshot_pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].username, "a");
        assert_eq!(pending[1].username, "b");
    }

    #[test]
    fn finished_and_elimination_flags() {
        let process = TargetProcess::new(Target::new("ssh", "127.0.0.1", 22), 4);
        assert!(!process.is_finished());
        process.mark_finished();
        assert!(process.is_finished());

        assert!(!process.is_user_eliminated("admin"));
        process.eliminate_user("admin");
        assert!(process.is_user_eliminated("admin"));
    }
}
