//! Retry policy for segment fetches.
//!
//! Classifies segment failures (timeout, throttling, connection, 5xx) and
//! applies bounded exponential backoff. Retries are off unless the config's
//! `[retry]` section is present; without it the first segment error fails
//! the whole download.

use std::time::Duration;

use crate::error::SegmentError;

/// High-level classification of a segment failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect or transfer).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (reset, DNS, server closed early).
    Connection,
    /// Retryable HTTP status that is not throttling (other 5xx).
    Http5xx(u16),
    /// Anything else; never retried.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Exponential backoff with caps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff decision for a 1-based attempt number and error kind.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        match kind {
            ErrorKind::Other => RetryDecision::NoRetry,
            ErrorKind::Timeout
            | ErrorKind::Throttled
            | ErrorKind::Connection
            | ErrorKind::Http5xx(_) => {
                let exp = 1u32 << attempt.saturating_sub(1).min(8);
                let delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

/// Classifies a segment failure into an `ErrorKind`.
///
/// Storage failures and cancel-on-failure aborts are terminal; a short body
/// usually means the server closed the connection early, so it counts as a
/// connection failure and is retryable.
pub fn classify(e: &SegmentError) -> ErrorKind {
    match e {
        SegmentError::Transport(ce) => classify_curl_error(ce),
        SegmentError::Http(code) => classify_http_status(*code),
        SegmentError::ShortBody { .. } => ErrorKind::Connection,
        SegmentError::Storage(_) | SegmentError::Aborted => ErrorKind::Other,
    }
}

fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Runs `f` until it succeeds or the policy says stop, sleeping between
/// attempts.
pub fn run_with_retry<F>(policy: &RetryPolicy, mut f: F) -> Result<(), SegmentError>
where
    F: FnMut() -> Result<(), SegmentError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(()) => return Ok(()),
            Err(e) => {
                let kind = classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(delay) => {
                        tracing::debug!(attempt, ?kind, ?delay, "retrying segment after failure: {}", e);
                        std::thread::sleep(delay);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
