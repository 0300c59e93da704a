//! Retry policy for AUR requests.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts for one request.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// HTTP failures that will not improve by asking again.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited by the AUR ({0}). Try again later.")]
    RateLimited(String),

    #[error("Request rejected with HTTP {0}")]
    Rejected(u16),
}

/// Classifies a status error. `Ok(())` means the request may be retried.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts, etc.
        return Ok(());
    };

    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "unknown url".to_string());

    match status {
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(url)),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimited(url)),
        s if s.is_client_error() => Err(NonRetryableError::Rejected(s.as_u16())),
        _ => Ok(()),
    }
}

/// Wraps a status error, converting it to [`NonRetryableError`] when retrying is pointless.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
