//! Shared HTTP transport for the provider clients
//!
//! One POST with exponential backoff on transient failures. Rate limiting
//! is returned to the caller straight away with the server's retry-after.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use super::LlmError;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Fallback when a 429 carries no usable retry-after header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt.saturating_sub(1)))
}

/// Seconds form of the retry-after header; HTTP dates fall back to the default
fn parse_retry_after(header: Option<&str>) -> Duration {
    let secs = header
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

/// Whether a failed attempt (0-based) gets another try
fn should_retry(error: &LlmError, attempt: u32) -> bool {
    error.is_retryable() && attempt < MAX_RETRIES
}

/// Map a non-success response to its error
async fn error_for(response: Response) -> LlmError {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let header = response.headers().get("retry-after").and_then(|v| v.to_str().ok());
        return LlmError::RateLimited {
            retry_after: parse_retry_after(header),
        };
    }
    let message = response.text().await.unwrap_or_default();
    LlmError::ApiError {
        status: status.as_u16(),
        message,
    }
}

/// Send the request built by `build`, retrying transient failures
///
/// `build` is called once per attempt since a sent builder is consumed.
pub(super) async fn send<F>(provider: &'static str, build: F) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    debug!(provider, "transport::send: called");
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = backoff(attempt);
            warn!(provider, attempt, backoff_ms = delay.as_millis() as u64, "Retrying after transient error");
            tokio::time::sleep(delay).await;
        }

        let error = match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => error_for(response).await,
            Err(e) => LlmError::Network(e),
        };

        if !should_retry(&error, attempt) {
            debug!(provider, attempt, error = %error, "transport::send: giving up");
            return Err(error);
        }
        debug!(provider, attempt, error = %error, "transport::send: transient error");
        attempt += 1;
    }
}
