#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! The multi-protocol credential brute-force scheduling and execution
//! engine: handler registry, rate limiter, per-target process state, the
//! engine itself, a declarative builder, and progress reporting.

mod api;
mod builder;
mod config;
mod engine;
mod handler;
mod limiter;
mod progress;
mod registry;
mod target;

pub use api::{AttemptOutcome, ConcurrencyStatus, EngineEvent, FinalStats};
pub use builder::Builder;
pub use config::EngineConfig;
pub use engine::Engine;
pub use handler::Handler;
pub use limiter::{RateLimitStatus, RateLimiter};
pub use progress::ProgressSample;
pub use registry::HandlerRegistry;
pub use target::TargetProcess;

/// One-shot convenience wrapper: build an engine for a single target with
/// one username/password dictionary pair, run it to completion, and
/// return the results collected via the result callback.
///
/// Equivalent to constructing a [`Builder`] with one target and awaiting
/// the engine it produces; provided for callers who don't need to touch
/// the builder directly.
pub async fn quick(
    registry: std::sync::Arc<HandlerRegistry>,
    protocol: &str,
    host: &str,
    port: u16,
    usernames: Vec<String>,
    passwords: Vec<String>,
    config: EngineConfig,
) -> Result<Vec<AttemptOutcome>, bf_core::EngineError> {
    let results = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let collected = results.clone();

    let engine = Builder::new(registry, config)
        .target(protocol, host, port)
        .user_dict(usernames)
        .pass_dict(passwords)
        .result_callback(move |result| {
            collected.lock().push(AttemptOutcome::from(&result));
        })
        .build()?;

    engine.start().await?;
    Ok(std::sync::Arc::try_unwrap(results)
        .map(parking_lot::Mutex::into_inner)
        .unwrap_or_else(|arc| arc.lock().clone()))
}

/// One-shot convenience wrapper over many targets sharing one credential
/// set. See [`quick`] for the single-target case.
pub async fn batch(
    registry: std::sync::Arc<HandlerRegistry>,
    targets: Vec<(String, String, u16)>,
    usernames: Vec<String>,
    passwords: Vec<String>,
    config: EngineConfig,
) -> Result<Vec<AttemptOutcome>, bf_core::EngineError> {
    let results = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let collected = results.clone();

    let mut builder = Builder::new(registry, config)
        .user_dict(usernames)
        .pass_dict(passwords)
        .result_callback(move |result| {
            collected.lock().push(AttemptOutcome::from(&result));
        });
    for (protocol, host, port) in targets {
        builder = builder.target(&protocol, &host, port);
    }

    let engine = builder.build()?;
    engine.start().await?;
    Ok(std::sync::Arc::try_unwrap(results)
        .map(parking_lot::Mutex::into_inner)
        .unwrap_or_else(|arc| arc.lock().clone()))
}
