// Shared blocking HTTP plumbing for provider clients

use std::time::Duration;
use tracing::{debug, error, warn};

use super::ProviderError;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);
const EXPONENTIAL_BACKOFF_BASE: u32 = 2;

/// Build a ureq agent whose every request is bounded by `timeout`
#[inline]
pub fn agent_with_timeout(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Run `request_fn` until it succeeds, a non-retryable error occurs, or `attempts` is exhausted.
///
/// Transport failures, HTTP 5xx and HTTP 429 are retried with exponential backoff starting at
/// `backoff`. Any other HTTP status fails immediately.
#[inline]
pub fn send_with_retry<F>(
    endpoint: &str,
    attempts: u32,
    backoff: Duration,
    mut request_fn: F,
) -> Result<String, ProviderError>
where
    F: FnMut() -> Result<String, ureq::Error>,
{
    let attempts = attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        debug!("HTTP request attempt {}/{} to {}", attempt, attempts, endpoint);

        match request_fn() {
            Ok(response_text) => {
                debug!("Request succeeded on attempt {}", attempt);
                return Ok(response_text);
            }
            Err(ureq::Error::StatusCode(status)) if status >= 500 || status == 429 => {
                warn!(
                    "Provider returned HTTP {}, attempt {}/{}",
                    status, attempt, attempts
                );
                last_error = format!("HTTP {}", status);
            }
            Err(ureq::Error::StatusCode(status)) => {
                warn!("Client error (status {}), not retrying", status);
                return Err(ProviderError::Rejected {
                    status,
                    message: format!("{} answered HTTP {}", endpoint, status),
                });
            }
            Err(
                error @ (ureq::Error::ConnectionFailed
                | ureq::Error::HostNotFound
                | ureq::Error::Timeout(_)
                | ureq::Error::Io(_)),
            ) => {
                warn!(
                    "Transport error: {}, attempt {}/{}",
                    error, attempt, attempts
                );
                last_error = error.to_string();
            }
            Err(error) => {
                warn!("Non-retryable error: {}", error);
                return Err(ProviderError::InvalidResponse(error.to_string()));
            }
        }

        if attempt < attempts {
            let delay = backoff * EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1);
            debug!("Waiting {:?} before retry", delay);
            std::thread::sleep(delay);
        }
    }

    error!("All {} attempts failed for request to {}", attempts, endpoint);
    Err(ProviderError::Transient {
        attempts,
        message: last_error,
    })
}
