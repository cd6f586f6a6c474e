//! Download orchestrator: probe, plan, concurrent fetch, barrier, merge.
//!
//! One OS thread per segment, created fresh per download. Fetch completion
//! order is unordered; merge order is strictly by index. The barrier is
//! full: every task reaches a terminal state before the outcome is decided,
//! and a single failure means the merger never runs and the target file is
//! never touched.

mod segment;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SfetchConfig;
use crate::error::{DownloadError, SegmentError};
use crate::http::HttpOptions;
use crate::merger;
use crate::probe;
use crate::progress::{self, ProgressEvent};
use crate::retry::{self, RetryPolicy};
use crate::segmenter;
use crate::store::SegmentStore;

/// One download invocation. Immutable once created.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Source URL.
    pub url: String,
    /// Final output file path.
    pub target_path: PathBuf,
    /// Number of parallel segments; must be at least 1.
    pub segment_count: usize,
}

/// Result of a successful download.
#[derive(Debug, Clone, Copy)]
pub struct DownloadOutcome {
    /// Bytes written to the target file.
    pub total_bytes: u64,
    /// Wall-clock time from probe to merge.
    pub elapsed: Duration,
}

/// Policy knobs for one download, derived from config.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
    pub http: HttpOptions,
    /// When true, the first segment failure aborts in-flight siblings.
    /// Default false: siblings run to completion behind the barrier.
    pub cancel_on_failure: bool,
    /// Per-segment retry policy; `None` fails the download on first error.
    pub retry: Option<RetryPolicy>,
}

impl DownloadOptions {
    pub fn from_config(cfg: &SfetchConfig) -> Self {
        Self {
            http: cfg.http_options(),
            cancel_on_failure: cfg.cancel_on_failure,
            retry: cfg.retry_policy(),
        }
    }
}

/// Runs a download to completion: HEAD probe, range plan, one fetch task per
/// segment, full barrier, ordered merge.
pub fn run(
    request: &DownloadRequest,
    options: &DownloadOptions,
    progress: Option<&Sender<ProgressEvent>>,
) -> Result<DownloadOutcome, DownloadError> {
    let started = Instant::now();
    tracing::info!(url = %request.url, segments = request.segment_count, "starting download");

    let head = probe::probe(&request.url, &options.http)?;
    progress::send(progress, ProgressEvent::Probed { total_bytes: head.content_length });

    let plan = segmenter::plan(head.content_length, request.segment_count)?;

    let parent = request
        .target_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let store = SegmentStore::create_in(parent, plan.len()).map_err(|source| {
        DownloadError::TargetUnwritable {
            path: parent.to_path_buf(),
            source,
        }
    })?;

    let abort = options
        .cancel_on_failure
        .then(|| Arc::new(AtomicBool::new(false)));

    // Explicit task list: each task owns its own (index, range) pair.
    let (tx, rx) = mpsc::channel();
    let mut handles = Vec::with_capacity(plan.len());
    for (index, range) in plan.iter().copied().enumerate() {
        let tx = tx.clone();
        let url = request.url.clone();
        let store = store.clone();
        let http = options.http;
        let retry_policy = options.retry;
        let abort = abort.clone();
        let progress_tx = progress.cloned();
        handles.push(thread::spawn(move || {
            let fetch = || {
                segment::fetch_segment(
                    &url,
                    index,
                    range,
                    &store,
                    &http,
                    progress_tx.as_ref(),
                    abort.as_deref(),
                )
            };
            let result = match retry_policy {
                Some(policy) => retry::run_with_retry(&policy, fetch),
                None => fetch(),
            };
            if result.is_err() {
                if let Some(flag) = &abort {
                    flag.store(true, Ordering::Relaxed);
                }
            }
            let _ = tx.send((index, result));
        }));
    }
    drop(tx);

    // Full barrier: collect every task's terminal state, then join all
    // handles. No short-circuit on first failure.
    let mut results: Vec<(usize, Result<(), SegmentError>)> = Vec::with_capacity(plan.len());
    for _ in 0..plan.len() {
        let (index, result) = rx.recv().expect("fetch task result");
        if result.is_ok() {
            progress::send(progress, ProgressEvent::SegmentDone { index });
        }
        results.push((index, result));
    }
    for handle in handles {
        handle
            .join()
            .unwrap_or_else(|e| panic!("fetch task panicked: {:?}", e));
    }

    if let Some((index, e)) = select_failure(results) {
        tracing::warn!(index, error = %e, "segment failed, aborting download");
        // Scratch cleanup happens when `store` drops; the target is never
        // touched because the merger does not run.
        return Err(e.into_download_error(index));
    }

    let total_bytes = merger::merge(&store, &request.target_path)?;
    if let Err(e) = store.close() {
        tracing::warn!("scratch cleanup failed: {}", e);
    }
    progress::send(progress, ProgressEvent::Merged { total_bytes });

    let elapsed = started.elapsed();
    tracing::info!(
        total_bytes,
        elapsed_secs = elapsed.as_secs_f64(),
        "download complete"
    );
    Ok(DownloadOutcome { total_bytes, elapsed })
}

/// Picks the failure to surface: the lowest-index real failure, falling back
/// to the lowest-index abort if nothing else failed (cancelled siblings are a
/// consequence, not a cause).
fn select_failure(
    mut results: Vec<(usize, Result<(), SegmentError>)>,
) -> Option<(usize, SegmentError)> {
    results.sort_by_key(|(index, _)| *index);
    let mut terminal: Option<(usize, SegmentError)> = None;
    for (index, result) in results {
        if let Err(e) = result {
            let replaces = match &terminal {
                None => true,
                Some((_, SegmentError::Aborted)) => !matches!(e, SegmentError::Aborted),
                Some(_) => false,
            };
            if replaces {
                terminal = Some((index, e));
            }
        }
    }
    terminal
}
