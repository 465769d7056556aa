use std::time::Duration;

use async_trait::async_trait;
use bf_core::{Attempt, AttemptResult};
use bf_engine::Handler;

#[derive(Debug, thiserror::Error)]
enum HttpBasicError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// HTTP(S) Basic auth against `http://<host>:<port>/`. Only `401`/`403`
/// count as authentication failure; every other non-2xx status is a
/// handler failure rather than a success — tightening the status handling
/// the design notes flag as a source bug.
pub struct HttpBasicHandler {
    https: bool,
    client: reqwest::Client,
}

impl HttpBasicHandler {
    pub fn new(https: bool) -> Self {
        Self {
            https,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Handler for HttpBasicHandler {
    async fn execute(&self, attempt: &Attempt) -> AttemptResult {
        let scheme = if self.https { "https" } else { "http" };
        let url = format!("{scheme}://{}:{}/", attempt.target.host, attempt.target.port);

        let request = self
            .client
            .get(&url)
            .basic_auth(&attempt.username, Some(&attempt.password))
            .timeout(attempt.timeout);

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                AttemptResult::success(attempt.clone(), Duration::ZERO)
            }
            Ok(response) if matches!(response.status().as_u16(), 401 | 403) => {
                AttemptResult::failure(attempt.clone(), Duration::ZERO, "authentication refused")
            }
            Ok(response) => AttemptResult::failure(
                attempt.clone(),
                Duration::ZERO,
                format!("unexpected status {}", response.status()),
            ),
            Err(err) => {
                let err = HttpBasicError::from(err);
                if err_is_connect_failure(&err) {
                    AttemptResult::terminal_failure(attempt.clone(), Duration::ZERO, err.to_string())
                } else {
                    AttemptResult::failure(attempt.clone(), Duration::ZERO, err.to_string())
                }
            }
        }
    }
}

fn err_is_connect_failure(err: &HttpBasicError) -> bool {
    match err {
        HttpBasicError::Request(err) => err.is_connect() || err.is_timeout(),
    }
}
