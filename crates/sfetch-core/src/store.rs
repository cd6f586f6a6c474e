//! Segment store: per-download scratch directory of part files.
//!
//! One part file per segment index, written exactly once by the fetch task
//! that owns the index and read exactly once by the merger after the barrier.
//! The scratch directory lives beside the target so no partial state is left
//! in shared locations; dropping the store removes it, which covers failed
//! runs, and `close` removes it eagerly after a successful merge.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

/// Handle to the scratch directory. Cheap to clone into fetch tasks; the
/// directory is removed when the last clone is dropped or `close` is called.
#[derive(Clone)]
pub struct SegmentStore {
    dir: Arc<TempDir>,
    segment_count: usize,
}

impl SegmentStore {
    /// Creates the scratch directory under `parent` (normally the target's
    /// parent directory).
    pub fn create_in(parent: &Path, segment_count: usize) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(".sfetch-segments-")
            .tempdir_in(parent)?;
        tracing::debug!(dir = %dir.path().display(), segment_count, "segment store created");
        Ok(Self {
            dir: Arc::new(dir),
            segment_count,
        })
    }

    /// Number of segment slots.
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Deterministic part-file path for a segment index.
    pub fn part_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("segment-{}.part", index))
    }

    /// Opens this index's slot for writing, truncating any earlier attempt so
    /// a retried segment starts from an empty file.
    pub fn writer(&self, index: usize) -> io::Result<SegmentWriter> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.part_path(index))?;
        Ok(SegmentWriter { file, written: 0 })
    }

    /// Reads a completed slot back in full. Merger-side, after the barrier.
    pub fn read_segment(&self, index: usize) -> io::Result<Vec<u8>> {
        std::fs::read(self.part_path(index))
    }

    /// Removes the scratch directory. A no-op if another clone is still
    /// alive; that clone's drop performs the removal instead.
    pub fn close(self) -> io::Result<()> {
        match Arc::try_unwrap(self.dir) {
            Ok(dir) => dir.close(),
            Err(_) => Ok(()),
        }
    }
}

/// Write handle for one segment slot, exclusively owned by its fetch task.
pub struct SegmentWriter {
    file: File,
    written: u64,
}

impl SegmentWriter {
    /// Appends one body chunk.
    pub fn append(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Total bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_round_trip_out_of_order() {
        let parent = tempfile::tempdir().unwrap();
        let store = SegmentStore::create_in(parent.path(), 3).unwrap();

        let mut w2 = store.writer(2).unwrap();
        w2.append(b"tail").unwrap();
        let mut w0 = store.writer(0).unwrap();
        w0.append(b"head").unwrap();
        assert_eq!(w0.written(), 4);
        drop((w0, w2));

        assert_eq!(store.read_segment(0).unwrap(), b"head");
        assert_eq!(store.read_segment(2).unwrap(), b"tail");
    }

    #[test]
    fn part_names_are_deterministic_by_index() {
        let parent = tempfile::tempdir().unwrap();
        let store = SegmentStore::create_in(parent.path(), 2).unwrap();
        assert!(store
            .part_path(1)
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .ends_with("segment-1.part"));
    }

    #[test]
    fn rewriting_a_slot_truncates_earlier_attempt() {
        let parent = tempfile::tempdir().unwrap();
        let store = SegmentStore::create_in(parent.path(), 1).unwrap();

        let mut w = store.writer(0).unwrap();
        w.append(b"garbage from a failed attempt").unwrap();
        drop(w);

        let mut w = store.writer(0).unwrap();
        w.append(b"ok").unwrap();
        drop(w);

        assert_eq!(store.read_segment(0).unwrap(), b"ok");
    }

    #[test]
    fn close_removes_scratch_dir() {
        let parent = tempfile::tempdir().unwrap();
        let store = SegmentStore::create_in(parent.path(), 1).unwrap();
        let scratch = store.part_path(0).parent().unwrap().to_path_buf();
        assert!(scratch.exists());
        store.close().unwrap();
        assert!(!scratch.exists());
    }

    #[test]
    fn drop_cleans_up_when_clones_exist() {
        let parent = tempfile::tempdir().unwrap();
        let store = SegmentStore::create_in(parent.path(), 1).unwrap();
        let scratch = store.part_path(0).parent().unwrap().to_path_buf();
        let clone = store.clone();
        store.close().unwrap(); // clone still alive, directory stays
        assert!(scratch.exists());
        drop(clone);
        assert!(!scratch.exists());
    }
}
