//! Range planning: split a resource into contiguous byte ranges.

use crate::error::DownloadError;

/// A single segment's byte range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset covered by this segment.
    pub start: u64,
    /// Last byte offset covered by this segment.
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the HTTP `Range` header: `bytes=start-end`.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Plans `segment_count` contiguous ranges covering `[0, total_size - 1]`.
///
/// Ranges are as equal as possible; when the size does not divide evenly the
/// earliest segments are one byte longer. Consecutive ranges satisfy
/// `r[i].end + 1 == r[i + 1].start`, the first starts at 0, and the last ends
/// at `total_size - 1`.
///
/// Fails with `InvalidInput` when `segment_count` is zero or the resource has
/// fewer bytes than segments (a range with `start > end` would result).
pub fn plan(total_size: u64, segment_count: usize) -> Result<Vec<ByteRange>, DownloadError> {
    if segment_count == 0 || total_size < segment_count as u64 {
        return Err(DownloadError::InvalidInput {
            total_size,
            segment_count,
        });
    }

    let n = segment_count as u64;
    let base = total_size / n;
    let remainder = total_size % n;

    let mut out = Vec::with_capacity(segment_count);
    let mut start = 0u64;
    for i in 0..n {
        let len = base + u64::from(i < remainder);
        out.push(ByteRange {
            start,
            end: start + len - 1,
        });
        start += len;
    }

    Ok(out)
}
