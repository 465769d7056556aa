use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use bf_engine::EngineConfig;

fn parse_millis(raw: &str) -> Result<Duration, String> {
    raw.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|err| format!("invalid duration {raw:?}: {err}"))
}

fn parse_secs(raw: &str) -> Result<Duration, String> {
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|err| format!("invalid duration {raw:?}: {err}"))
}

/// Multi-protocol credential brute-force engine.
#[derive(Debug, Parser)]
#[command(name = "polybrute", version, about = "Multi-protocol credential brute-force engine")]
pub struct Cli {
    /// Service-target file: one `protocol://host[:port]` entry per line.
    #[arg(long, env = "POLYBRUTE_TARGETS")]
    pub targets: PathBuf,

    /// Username dictionary file (UTF-8, `#` comments, blank lines skipped).
    #[arg(long, env = "POLYBRUTE_USERDICT")]
    pub userdict: Option<PathBuf>,

    /// A single username, usable instead of or alongside `--userdict`.
    #[arg(long = "user")]
    pub users: Vec<String>,

    /// Password dictionary file.
    #[arg(long, env = "POLYBRUTE_PASSDICT")]
    pub passdict: Option<PathBuf>,

    /// A single password, usable instead of or alongside `--passdict`.
    #[arg(long = "pass")]
    pub passwords: Vec<String>,

    /// Maximum attempts in flight across the whole engine.
    #[arg(
        long,
        env = "POLYBRUTE_TARGET_CONCURRENT",
        default_value_t = EngineConfig::DEFAULT_TARGET_CONCURRENT
    )]
    pub target_concurrent: usize,

    /// Maximum attempts in flight against any one target.
    #[arg(
        long,
        env = "POLYBRUTE_TASK_CONCURRENT",
        default_value_t = EngineConfig::DEFAULT_TASK_CONCURRENT
    )]
    pub task_concurrent: usize,

    /// Minimum interval between token releases in the shared limiter, in
    /// milliseconds. `0` disables rate limiting.
    #[arg(long, env = "POLYBRUTE_MIN_DELAY_MS", value_parser = parse_millis, default_value = "100")]
    pub min_delay: Duration,

    /// Upper bound used when randomizing inter-attempt delay, in
    /// milliseconds.
    #[arg(long, env = "POLYBRUTE_MAX_DELAY_MS", value_parser = parse_millis, default_value = "500")]
    pub max_delay: Duration,

    /// Per-attempt wall-clock budget, in seconds.
    #[arg(long, env = "POLYBRUTE_TIMEOUT_SECS", value_parser = parse_secs, default_value = "10")]
    pub timeout: Duration,

    /// Retries permitted per attempt (reserved; handlers may honor it).
    #[arg(long, default_value_t = EngineConfig::DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Stop dispatching further attempts against a target after its first
    /// success.
    #[arg(long)]
    pub ok_to_stop: bool,

    /// Include the empty string as a username rather than filtering it.
    #[arg(long)]
    pub allow_blank_username: bool,

    /// Include the empty string as a password rather than filtering it.
    #[arg(long)]
    pub allow_blank_password: bool,

    /// Print a periodic progress line.
    #[arg(long)]
    pub progress: bool,
}
