use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use bf_core::{Attempt, AttemptResult, EngineError, Target};

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::handler::Handler;
use crate::registry::HandlerRegistry;

/// Declarative assembly of an [`Engine`]: chainable setters for config,
/// targets, dictionaries, and the result callback; `build()` produces the
/// Cartesian product of credentials and feeds them into the engine.
pub struct Builder {
    registry: Arc<HandlerRegistry>,
    config: EngineConfig,
    cancel: CancellationToken,
    targets: Vec<(String, String, u16)>,
    user_dict: Vec<String>,
    pass_dict: Vec<String>,
    user_dict_file: Option<PathBuf>,
    pass_dict_file: Option<PathBuf>,
    result_callback: Option<Arc<dyn Fn(AttemptResult) + Send + Sync>>,
}

impl Builder {
    pub fn new(registry: Arc<HandlerRegistry>, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            cancel: CancellationToken::new(),
            targets: Vec::new(),
            user_dict: Vec::new(),
            pass_dict: Vec::new(),
            user_dict_file: None,
            pass_dict_file: None,
            result_callback: None,
        }
    }

    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// `protocol` is normalized to lowercase here so the tag registered
    /// with the engine (see `Engine::add_target`) always matches the tag
    /// used to build each fed `Attempt`'s `Target` below.
    pub fn target(mut self, protocol: &str, host: &str, port: u16) -> Self {
        self.targets
            .push((protocol.to_ascii_lowercase(), host.to_string(), port));
        self
    }

    pub fn targets(mut self, targets: impl IntoIterator<Item = (String, String, u16)>) -> Self {
        self.targets.extend(
            targets
                .into_iter()
                .map(|(protocol, host, port)| (protocol.to_ascii_lowercase(), host, port)),
        );
        self
    }

    pub fn user_dict(mut self, users: impl IntoIterator<Item = String>) -> Self {
        self.user_dict.extend(users);
        self
    }

    pub fn user_dict_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_dict_file = Some(path.into());
        self
    }

    pub fn pass_dict(mut self, passwords: impl IntoIterator<Item = String>) -> Self {
        self.pass_dict.extend(passwords);
        self
    }

    pub fn pass_dict_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pass_dict_file = Some(path.into());
        self
    }

    pub fn result_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(AttemptResult) + Send + Sync + 'static,
    {
        self.result_callback = Some(Arc::new(callback));
        self
    }

    pub fn target_concurrent(mut self, n: usize) -> Self {
        self.config.target_concurrent = n;
        self
    }

    pub fn task_concurrent(mut self, n: usize) -> Self {
        self.config.task_concurrent = n;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn min_delay(mut self, delay: Duration) -> Self {
        self.config.min_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn ok_to_stop(mut self, enabled: bool) -> Self {
        self.config.ok_to_stop = enabled;
        self
    }

    pub fn custom_callback(mut self, handler: Arc<dyn Handler>) -> Self {
        self.config.custom_callback = Some(handler);
        self
    }

    /// 1. Merges file dictionaries into the in-memory ones. 2. Deduplicates
    /// both, order-preserving. 3. Constructs the engine. 4. Registers every
    /// declared target. 5. Feeds the Cartesian product of targets ×
    /// usernames × passwords, applying the empty-credential filter. 6.
    /// Installs the result callback. 7. Returns the engine ready for
    /// `start()`.
    pub fn build(mut self) -> Result<Engine, EngineError> {
        if let Some(path) = self.user_dict_file.take() {
            self.user_dict.extend(bf_core::load_dictionary_file(path)?);
        }
        if let Some(path) = self.pass_dict_file.take() {
            self.pass_dict.extend(bf_core::load_dictionary_file(path)?);
        }

        dedup_preserve_order(&mut self.user_dict);
        dedup_preserve_order(&mut self.pass_dict);

        if self.config.allow_blank_username && !self.user_dict.iter().any(String::is_empty) {
            self.user_dict.push(String::new());
        }
        if self.config.allow_blank_password && !self.pass_dict.iter().any(String::is_empty) {
            self.pass_dict.push(String::new());
        }

        self.config.user_dict = self.user_dict.clone();
        self.config.pass_dict = self.pass_dict.clone();
        self.config.user_dict_file = None;
        self.config.pass_dict_file = None;

        let engine = Engine::new(self.cancel.clone(), self.config.clone(), self.registry)?;

        for (protocol, host, port) in &self.targets {
            engine.add_target(protocol, host, port.to_owned())?;
        }

        let skip_empty_username = self.config.skip_empty_username && !self.config.allow_blank_username;
        let skip_empty_password = self.config.skip_empty_password && !self.config.allow_blank_password;

        for (protocol, host, port) in &self.targets {
            let target = Target::new(protocol.clone(), host.clone(), *port);
            for username in &self.user_dict {
                if username.is_empty() && skip_empty_username {
                    continue;
                }
                for password in &self.pass_dict {
                    if password.is_empty() && skip_empty_password {
                        continue;
                    }
                    let attempt = Attempt::new(
                        target.clone(),
                        username.clone(),
                        password.clone(),
                        self.config.timeout,
                        self.cancel.child_token(),
                    );
                    engine.feed(attempt)?;
                }
            }
        }

        if let Some(callback) = self.result_callback {
            engine.set_result_callback(callback);
        }

        Ok(engine)
    }
}

fn dedup_preserve_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let mut items = vec!["a".to_string(), "b".to_string(), "a".to_string(), "c".to_string()];
        dedup_preserve_order(&mut items);
        assert_eq!(items, vec!["a", "b", "c"]);
    }
}
