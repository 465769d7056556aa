use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::handler::Handler;

/// Process-free mapping from lowercase protocol tag to a handler. Populated
/// before `Engine::start`; modification during a run is undefined.
///
/// Deliberately an ordinary value passed into the engine rather than
/// package-level mutable state — the source's registry is a global; this
/// one is constructed by the caller and handed to the `Engine`.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent overwrite; last registration wins.
    pub fn register(&self, tag: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.write().insert(tag.into(), handler);
    }

    /// O(1) lookup.
    pub fn lookup(&self, tag: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().get(tag).cloned()
    }

    /// Tags with a registered handler, used by the CLI for validation.
    pub fn supported(&self) -> Vec<String> {
        self.handlers.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::{Attempt, AttemptResult};
    use std::time::Duration;

    struct AlwaysFail;

    #[async_trait::async_trait]
    impl Handler for AlwaysFail {
        async fn execute(&self, attempt: &Attempt) -> AttemptResult {
            AttemptResult::failure(attempt.clone(), Duration::ZERO, "nope")
        }
    }

    #[test]
    fn register_lookup_last_wins() {
        let registry = HandlerRegistry::new();
        registry.register("ssh", Arc::new(AlwaysFail));
        assert!(registry.lookup("ssh").is_some());
        assert!(registry.lookup("ftp").is_none());
        assert_eq!(registry.supported(), vec!["ssh".to_string()]);
    }
}
