//! Single-segment HTTP Range GET, streamed into the segment's store slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::error::SegmentError;
use crate::http::{self, HttpOptions};
use crate::progress::{self, ProgressEvent};
use crate::segmenter::ByteRange;
use crate::store::SegmentStore;

pub(super) fn aborted(flag: Option<&AtomicBool>) -> bool {
    flag.map_or(false, |f| f.load(Ordering::Relaxed))
}

/// Fetches one segment: GET with `Range: bytes=start-end`, body appended to
/// this index's slot. The slot is truncated first, so a retry attempt starts
/// clean. Returns `SegmentError` so callers can classify and retry.
pub(super) fn fetch_segment(
    url: &str,
    index: usize,
    range: ByteRange,
    store: &SegmentStore,
    opts: &HttpOptions,
    progress: Option<&Sender<ProgressEvent>>,
    abort: Option<&AtomicBool>,
) -> Result<(), SegmentError> {
    if aborted(abort) {
        return Err(SegmentError::Aborted);
    }

    let mut writer = store.writer(index).map_err(SegmentError::Storage)?;
    progress::send(progress, ProgressEvent::SegmentStarted { index });

    let mut easy = curl::easy::Easy::new();
    http::apply_common(&mut easy, url, opts).map_err(SegmentError::Transport)?;
    // Abort if throughput drops below 1 KiB/s for 60s, so a stalled transfer
    // fails long before the hard request timeout.
    easy.low_speed_limit(1024).map_err(SegmentError::Transport)?;
    easy.low_speed_time(Duration::from_secs(60))
        .map_err(SegmentError::Transport)?;
    easy.range(&format!("{}-{}", range.start, range.end))
        .map_err(SegmentError::Transport)?;

    let mut storage_error: Option<std::io::Error> = None;
    let mut hit_abort = false;
    let perform_result = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                if aborted(abort) {
                    hit_abort = true;
                    return Ok(0);
                }
                match writer.append(data) {
                    Ok(()) => {
                        progress::send(
                            progress,
                            ProgressEvent::Fetched {
                                index,
                                bytes: data.len() as u64,
                            },
                        );
                        Ok(data.len())
                    }
                    Err(e) => {
                        storage_error = Some(e);
                        Ok(0)
                    }
                }
            })
            .map_err(SegmentError::Transport)?;
        transfer.perform()
    };

    if let Err(e) = perform_result {
        if hit_abort {
            return Err(SegmentError::Aborted);
        }
        if let Some(io_err) = storage_error {
            return Err(SegmentError::Storage(io_err));
        }
        return Err(SegmentError::Transport(e));
    }

    let code = easy.response_code().map_err(SegmentError::Transport)? as u32;
    if !(200..300).contains(&code) {
        return Err(SegmentError::Http(code));
    }

    let received = writer.written();
    let expected = range.len();
    if received != expected {
        return Err(SegmentError::ShortBody { expected, received });
    }

    Ok(())
}
