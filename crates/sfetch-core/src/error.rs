//! Error types for the download pipeline.
//!
//! `DownloadError` is the single terminal error surfaced to callers;
//! `SegmentError` is the per-segment failure carried from a fetch task to the
//! orchestrator's barrier, where it is classified (for retry) and converted.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Terminal error for one download invocation.
///
/// Probe and planning failures abort before any segment GET is issued; a
/// segment failure aborts the whole download after the barrier; merge
/// failures never leave a partially written target behind.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Segment count is zero or exceeds the resource size.
    #[error("invalid input: cannot split {total_size} bytes into {segment_count} segments")]
    InvalidInput {
        total_size: u64,
        segment_count: usize,
    },

    /// HEAD probe failed at the transport level.
    #[error("probe failed")]
    ProbeFailed(#[source] curl::Error),

    /// HEAD probe answered with a status outside the 2xx class.
    #[error("probe returned HTTP {0}")]
    BadStatus(u32),

    /// `Content-Length` header absent or not a valid non-negative integer.
    #[error("response has no usable Content-Length")]
    MissingLength,

    /// Transport-level failure while fetching one segment.
    #[error("segment {index}: {source}")]
    Network {
        index: usize,
        #[source]
        source: SegmentError,
    },

    /// Segment GET answered with a status outside the 2xx class.
    #[error("segment {index}: unexpected HTTP {code}")]
    UnexpectedStatus { index: usize, code: u32 },

    /// Part-file I/O failed while buffering a segment.
    #[error("segment {index}: store I/O failed")]
    StoreIo {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// Target (or its staging file) could not be created, written, or renamed.
    #[error("target {} unwritable", .path.display())]
    TargetUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fewer bytes reached the target than a segment supplied.
    #[error("partial write: {written} of {expected} bytes")]
    PartialWrite { expected: u64, written: u64 },
}

/// Error from a single segment fetch (transport, HTTP status, short body,
/// store write, or cooperative abort). Kept separate from `DownloadError` so
/// the retry policy can classify it before the orchestrator converts it.
#[derive(Debug)]
pub enum SegmentError {
    /// Curl reported an error (timeout, connection, TLS, etc.).
    Transport(curl::Error),
    /// HTTP response had a status outside the 2xx class.
    Http(u32),
    /// Transfer ended with a body length different from the requested range.
    ShortBody { expected: u64, received: u64 },
    /// Part-file write failed (disk full, permissions). Never retried.
    Storage(std::io::Error),
    /// A sibling segment failed and cancel-on-failure stopped this transfer.
    Aborted,
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentError::Transport(e) => write!(f, "{}", e),
            SegmentError::Http(code) => write!(f, "HTTP {}", code),
            SegmentError::ShortBody { expected, received } => {
                write!(f, "body length mismatch: expected {} bytes, got {}", expected, received)
            }
            SegmentError::Storage(e) => write!(f, "store write: {}", e),
            SegmentError::Aborted => write!(f, "aborted after sibling failure"),
        }
    }
}

impl std::error::Error for SegmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SegmentError::Transport(e) => Some(e),
            SegmentError::Storage(e) => Some(e),
            SegmentError::Http(_) | SegmentError::ShortBody { .. } | SegmentError::Aborted => None,
        }
    }
}

impl SegmentError {
    /// Converts a segment failure into the terminal error for the download.
    pub(crate) fn into_download_error(self, index: usize) -> DownloadError {
        match self {
            SegmentError::Http(code) => DownloadError::UnexpectedStatus { index, code },
            SegmentError::Storage(source) => DownloadError::StoreIo { index, source },
            other => DownloadError::Network { index, source: other },
        }
    }
}
