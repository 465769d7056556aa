use std::collections::HashMap;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::Target;

/// A single (protocol, host, port, username, password) probe. Immutable
/// once created.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub target: Target,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub extra: HashMap<String, String>,
    /// Cancellation handle a handler may observe directly; always a child
    /// of the engine's own token, so firing it cannot outlive the engine.
    pub cancellation: CancellationToken,
}

impl Attempt {
    pub fn new(
        target: Target,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            target,
            username: username.into(),
            password: password.into(),
            timeout,
            extra: HashMap::new(),
            cancellation,
        }
    }
}
