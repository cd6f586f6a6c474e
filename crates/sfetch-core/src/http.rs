//! Shared HTTP client context for the probe and the segment fetchers.
//!
//! One `HttpOptions` is owned by the orchestrator and lent to every request
//! it issues, so probe and fetch agree on identity and timeouts.

use std::time::Duration;

/// Identifying header sent with every request.
pub const USER_AGENT: &str = concat!("sfetch/", env!("CARGO_PKG_VERSION"));

/// Per-download HTTP settings, derived from config.
#[derive(Debug, Clone, Copy)]
pub struct HttpOptions {
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Hard wall-clock cap on a whole request, `None` = unlimited.
    pub request_timeout: Option<Duration>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Some(Duration::from_secs(3600)),
        }
    }
}

/// Applies the setup common to every request: URL, identifying header,
/// redirect following, and timeouts.
pub(crate) fn apply_common(
    easy: &mut curl::easy::Easy,
    url: &str,
    opts: &HttpOptions,
) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.useragent(USER_AGENT)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    if let Some(t) = opts.request_timeout {
        easy.timeout(t)?;
    }
    Ok(())
}
