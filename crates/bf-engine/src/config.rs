use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bf_core::EngineError;

use crate::handler::Handler;

/// Immutable for the lifetime of an engine after `start()`.
#[derive(Clone)]
pub struct EngineConfig {
    /// Maximum attempts in flight across the whole engine.
    pub target_concurrent: usize,
    /// Maximum attempts in flight against any one target.
    pub task_concurrent: usize,
    /// Minimum interval between token releases in the shared limiter.
    pub min_delay: Duration,
    /// Upper bound used when randomizing inter-attempt delay, where a
    /// handler chooses to honor it.
    pub max_delay: Duration,
    /// Per-attempt wall-clock budget passed to each handler.
    pub timeout: Duration,
    /// Retries permitted per attempt; reserved, handlers may honor it.
    pub max_retries: u32,
    /// If true, first success on a target sets its `finished` flag.
    pub ok_to_stop: bool,
    /// Cartesian-product filters applied during feed.
    pub skip_empty_username: bool,
    pub skip_empty_password: bool,
    /// Explicit permission to include the empty string as a credential.
    pub allow_blank_username: bool,
    pub allow_blank_password: bool,
    /// Enable the periodic progress line.
    pub show_progress: bool,
    /// In-memory dictionaries.
    pub user_dict: Vec<String>,
    pub pass_dict: Vec<String>,
    /// Dictionaries loaded from file at engine construction.
    pub user_dict_file: Option<PathBuf>,
    pub pass_dict_file: Option<PathBuf>,
    /// Optional override replacing handler-registry lookup entirely.
    pub custom_callback: Option<Arc<dyn Handler>>,
}

impl EngineConfig {
    pub const DEFAULT_TARGET_CONCURRENT: usize = 50;
    pub const DEFAULT_TASK_CONCURRENT: usize = 10;
    pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(100);
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Non-positive concurrency, non-positive timeout, negative
    /// `min_delay` (unrepresentable in `Duration`, so this only checks
    /// `min_delay > max_delay` when both are set), or `min_delay >
    /// max_delay` when both are greater than zero.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.target_concurrent == 0 {
            return Err(EngineError::ConfigInvalid(
                "target_concurrent must be > 0".into(),
            ));
        }
        if self.task_concurrent == 0 {
            return Err(EngineError::ConfigInvalid(
                "task_concurrent must be > 0".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(EngineError::ConfigInvalid("timeout must be > 0".into()));
        }
        if !self.min_delay.is_zero() && !self.max_delay.is_zero() && self.min_delay > self.max_delay
        {
            return Err(EngineError::ConfigInvalid(
                "min_delay must not exceed max_delay".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_concurrent: Self::DEFAULT_TARGET_CONCURRENT,
            task_concurrent: Self::DEFAULT_TASK_CONCURRENT,
            min_delay: Self::DEFAULT_MIN_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            timeout: Self::DEFAULT_TIMEOUT,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            ok_to_stop: false,
            skip_empty_username: true,
            skip_empty_password: true,
            allow_blank_username: false,
            allow_blank_password: false,
            show_progress: false,
            user_dict: Vec::new(),
            pass_dict: Vec::new(),
            user_dict_file: None,
            pass_dict_file: None,
            custom_callback: None,
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("target_concurrent", &self.target_concurrent)
            .field("task_concurrent", &self.task_concurrent)
            .field("min_delay", &self.min_delay)
            .field("max_delay", &self.max_delay)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("ok_to_stop", &self.ok_to_stop)
            .field("skip_empty_username", &self.skip_empty_username)
            .field("skip_empty_password", &self.skip_empty_password)
            .field("allow_blank_username", &self.allow_blank_username)
            .field("allow_blank_password", &self.allow_blank_password)
            .field("show_progress", &self.show_progress)
            .field("user_dict_len", &self.user_dict.len())
            .field("pass_dict_len", &self.pass_dict.len())
            .field("user_dict_file", &self.user_dict_file)
            .field("pass_dict_file", &self.pass_dict_file)
            .field("custom_callback", &self.custom_callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_delay_bounds() {
        let mut cfg = EngineConfig::default();
        cfg.min_delay = Duration::from_millis(500);
        cfg.max_delay = Duration::from_millis(100);
        assert!(matches!(
            cfg.validate(),
            Err(EngineError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut cfg = EngineConfig::default();
        cfg.target_concurrent = 0;
        assert!(cfg.validate().is_err());
    }
}
