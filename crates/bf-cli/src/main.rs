mod cli;
mod shutdown;
mod targets;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

use bf_engine::{Builder, EngineConfig, EngineEvent, HandlerRegistry};

use crate::cli::Cli;
use crate::shutdown::{spawn_ctrl_c_handler, ShutdownController, ShutdownEvent};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// Exit codes: 0 clean completion, 1 configuration error (surfaced via
/// `Err` from here), 2 partial failure — some attempts hit an engine-level
/// error rather than merely failing authentication.
async fn run(cli: Cli) -> anyhow::Result<i32> {
    let parsed_targets = targets::load_targets_file(&cli.targets)?;
    if parsed_targets.is_empty() {
        anyhow::bail!("targets file {} has no entries", cli.targets.display());
    }

    let mut usernames = cli.users.clone();
    if let Some(path) = &cli.userdict {
        usernames.extend(bf_core::load_dictionary_file(path)?);
    }
    let mut passwords = cli.passwords.clone();
    if let Some(path) = &cli.passdict {
        passwords.extend(bf_core::load_dictionary_file(path)?);
    }
    if usernames.is_empty() {
        anyhow::bail!("no usernames provided: pass --user or --userdict");
    }
    if passwords.is_empty() {
        anyhow::bail!("no passwords provided: pass --pass or --passdict");
    }

    let registry = Arc::new(HandlerRegistry::new());
    bf_handlers::register_default_handlers(&registry);

    let config = EngineConfig {
        target_concurrent: cli.target_concurrent,
        task_concurrent: cli.task_concurrent,
        min_delay: cli.min_delay,
        max_delay: cli.max_delay,
        timeout: cli.timeout,
        max_retries: cli.max_retries,
        ok_to_stop: cli.ok_to_stop,
        allow_blank_username: cli.allow_blank_username,
        allow_blank_password: cli.allow_blank_password,
        show_progress: cli.progress,
        ..EngineConfig::default()
    };

    let mut builder = Builder::new(registry, config)
        .user_dict(usernames)
        .pass_dict(passwords);
    for target in &parsed_targets {
        builder = builder.target(&target.protocol, &target.host, target.port);
    }

    let engine = builder.build().context("failed to build engine")?;
    let mut events = engine.subscribe();

    let shutdown = Arc::new(ShutdownController::new());
    let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel();
    spawn_ctrl_c_handler(shutdown, shutdown_tx);

    let run_handle = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.start().await })
    };

    let mut success_count: u64 = 0;
    let mut failed_count: u64 = 0;
    let mut any_engine_error = false;

    loop {
        tokio::select! {
            Some(event) = shutdown_rx.recv() => match event {
                ShutdownEvent::Graceful => {
                    eprintln!("stopping (press Ctrl-C again to force)...");
                    engine.stop().await;
                }
                ShutdownEvent::Immediate => {
                    eprintln!("forced shutdown");
                    std::process::exit(130);
                }
            },
            event = events.recv() => match event {
                Ok(EngineEvent::AttemptCompleted { outcome }) => {
                    if outcome.success {
                        success_count += 1;
                        println!(
                            "[+] {}://{}:{} {}:{}",
                            outcome.target.protocol,
                            outcome.target.host,
                            outcome.target.port,
                            outcome.username,
                            outcome.password,
                        );
                    } else {
                        failed_count += 1;
                    }
                }
                Ok(EngineEvent::Progress { line }) => println!("[progress] {line}"),
                Ok(EngineEvent::TargetFinished { target }) => {
                    println!("[*] target finished: {target}");
                }
                Ok(EngineEvent::Warning { message }) => eprintln!("warning: {message}"),
                Ok(EngineEvent::Error { message }) => {
                    any_engine_error = true;
                    eprintln!("error: {message}");
                }
                Ok(EngineEvent::Stopped { stats }) => {
                    println!(
                        "done: total={} processed={} success={} failed={}",
                        stats.total, stats.processed, stats.success, stats.failed,
                    );
                    break;
                }
                Ok(EngineEvent::Started) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
        }
    }

    run_handle.await??;

    println!("{success_count} successful credential(s), {failed_count} failed attempt(s)");
    Ok(if any_engine_error { 2 } else { 0 })
}
