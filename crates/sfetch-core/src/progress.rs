//! Byte-count progress events emitted during a download.
//!
//! The orchestrator is lent an optional sender; sends never block and a
//! dropped receiver never fails the download.

/// Forwards an event to an optional sender; a missing or hung-up receiver is
/// never an error.
pub(crate) fn send(progress: Option<&std::sync::mpsc::Sender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        let _ = tx.send(event);
    }
}

/// One progress observation. `Fetched` carries a byte delta, not a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Probe succeeded; total resource size is known.
    Probed { total_bytes: u64 },
    /// A fetch attempt for this segment started from an empty slot. Sent
    /// again when a retry restarts the segment.
    SegmentStarted { index: usize },
    /// Body bytes arrived for this segment.
    Fetched { index: usize, bytes: u64 },
    /// This segment's slot is complete.
    SegmentDone { index: usize },
    /// All segments merged into the target.
    Merged { total_bytes: u64 },
}

/// Folds progress events into displayable totals.
///
/// A `SegmentStarted` resets that segment's count, so a retried segment never
/// double-counts.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    per_segment: Vec<u64>,
    total_bytes: u64,
    segments_done: usize,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ProgressEvent) {
        match *event {
            ProgressEvent::Probed { total_bytes } => self.total_bytes = total_bytes,
            ProgressEvent::SegmentStarted { index } => {
                self.ensure_slot(index);
                self.per_segment[index] = 0;
            }
            ProgressEvent::Fetched { index, bytes } => {
                self.ensure_slot(index);
                self.per_segment[index] += bytes;
            }
            ProgressEvent::SegmentDone { .. } => self.segments_done += 1,
            ProgressEvent::Merged { .. } => {}
        }
    }

    fn ensure_slot(&mut self, index: usize) {
        if index >= self.per_segment.len() {
            self.per_segment.resize(index + 1, 0);
        }
    }

    /// Bytes fetched so far across all segments.
    pub fn bytes_done(&self) -> u64 {
        self.per_segment.iter().sum()
    }

    /// Total resource size, 0 before the probe event.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Segments completed so far.
    pub fn segments_done(&self) -> usize {
        self.segments_done
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_done() as f64 / self.total_bytes as f64).min(1.0)
    }
}
