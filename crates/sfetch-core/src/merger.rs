//! Ordered reassembly of fetched segments into the final file.
//!
//! Segments are written in ascending index order into a staging file beside
//! the target, then renamed onto the target in one step. A pre-existing
//! target is replaced by a complete new file, never appended to, and a failed
//! merge never mutates the target.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::DownloadError;
use crate::store::SegmentStore;

/// Concatenates all segments in index order into `target_path`.
/// Returns the total number of bytes written.
pub fn merge(store: &SegmentStore, target_path: &Path) -> Result<u64, DownloadError> {
    let staging = staging_path(target_path)?;

    let total = match write_segments(store, &staging) {
        Ok(total) => total,
        Err(e) => {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&staging, target_path) {
        let _ = fs::remove_file(&staging);
        return Err(DownloadError::TargetUnwritable {
            path: target_path.to_path_buf(),
            source: e,
        });
    }

    tracing::info!(total_bytes = total, target = %target_path.display(), "merge complete");
    Ok(total)
}

/// Staging file path: `<target>.part` in the same directory, so the final
/// rename stays on one filesystem.
fn staging_path(target_path: &Path) -> Result<PathBuf, DownloadError> {
    let file_name = target_path.file_name().ok_or_else(|| DownloadError::TargetUnwritable {
        path: target_path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "target path has no file name"),
    })?;
    let mut staging_name = file_name.to_os_string();
    staging_name.push(".part");
    Ok(target_path.with_file_name(staging_name))
}

fn write_segments(store: &SegmentStore, staging: &Path) -> Result<u64, DownloadError> {
    let unwritable = |source: std::io::Error| DownloadError::TargetUnwritable {
        path: staging.to_path_buf(),
        source,
    };

    let mut out = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(staging)
        .map_err(unwritable)?;

    let mut total = 0u64;
    for index in 0..store.segment_count() {
        let bytes = store
            .read_segment(index)
            .map_err(|source| DownloadError::StoreIo { index, source })?;

        let mut off = 0usize;
        while off < bytes.len() {
            let n = out.write(&bytes[off..]).map_err(unwritable)?;
            if n == 0 {
                return Err(DownloadError::PartialWrite {
                    expected: bytes.len() as u64,
                    written: off as u64,
                });
            }
            off += n;
        }
        total += bytes.len() as u64;
        tracing::debug!(index, bytes = bytes.len(), "segment merged");
    }

    out.sync_all().map_err(unwritable)?;
    Ok(total)
}
