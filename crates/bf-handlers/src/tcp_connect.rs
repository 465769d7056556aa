use std::time::Duration;

use async_trait::async_trait;
use bf_core::{Attempt, AttemptResult};
use bf_engine::Handler;

/// A connectivity probe: opens the TCP socket within the attempt's
/// timeout. Reports `finished=true` on refusal/unreachable (the target is
/// dead, further attempts are pointless), and `success=false` otherwise —
/// this does not speak the protocol's real authentication handshake,
/// which is out of scope of the engine's contract.
pub struct TcpConnectHandler;

#[async_trait]
impl Handler for TcpConnectHandler {
    async fn execute(&self, attempt: &Attempt) -> AttemptResult {
        let addr = format!("{}:{}", attempt.target.host, attempt.target.port);
        let connect = tokio::net::TcpStream::connect(&addr);

        match tokio::time::timeout(attempt.timeout, connect).await {
            Ok(Ok(_stream)) => AttemptResult::failure(
                attempt.clone(),
                Duration::ZERO,
                "connected; credential not verified by this handler",
            ),
            Ok(Err(err)) => {
                AttemptResult::terminal_failure(attempt.clone(), Duration::ZERO, err.to_string())
            }
            Err(_) => AttemptResult::failure(attempt.clone(), Duration::ZERO, "connect timed out"),
        }
    }
}
