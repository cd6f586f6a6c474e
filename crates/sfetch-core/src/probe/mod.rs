//! Metadata probe: HEAD request establishing the resource's total size.
//!
//! The probe runs before any segment GET; a transport error, non-2xx status,
//! or unusable `Content-Length` fails the download with zero bytes fetched.

mod parse;

use std::str;

use crate::error::DownloadError;
use crate::http::{self, HttpOptions};

/// Parsed result of the HEAD probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbeResult {
    /// Total resource size in bytes.
    pub content_length: u64,
    /// True if the server sent `Accept-Ranges: bytes`. Advisory only: range
    /// GETs are issued either way.
    pub accept_ranges: bool,
}

/// Performs a HEAD request and returns the parsed metadata.
pub fn probe(url: &str, opts: &HttpOptions) -> Result<ProbeResult, DownloadError> {
    let mut header_lines: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    http::apply_common(&mut easy, url, opts).map_err(DownloadError::ProbeFailed)?;
    easy.nobody(true).map_err(DownloadError::ProbeFailed)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(DownloadError::ProbeFailed)?;
        transfer.perform().map_err(DownloadError::ProbeFailed)?;
    }

    let code = easy.response_code().map_err(DownloadError::ProbeFailed)? as u32;
    if !(200..300).contains(&code) {
        return Err(DownloadError::BadStatus(code));
    }

    let head = parse::parse_head_lines(&header_lines);
    let content_length = head.content_length.ok_or(DownloadError::MissingLength)?;
    if !head.accept_ranges {
        tracing::warn!(url, "server does not advertise Accept-Ranges: bytes");
    }
    tracing::debug!(url, content_length, accept_ranges = head.accept_ranges, "probe complete");

    Ok(ProbeResult {
        content_length,
        accept_ranges: head.accept_ranges,
    })
}
