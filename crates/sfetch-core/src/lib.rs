//! Core engine for sfetch: a concurrent segmented file downloader.
//!
//! A download probes the resource size with a HEAD request, splits the byte
//! range into contiguous segments, fetches each segment in parallel over
//! HTTP Range GETs into a scratch store, and merges the segments in index
//! order into the target file. Any failure leaves the target untouched.

pub mod config;
pub mod logging;

pub mod downloader;
pub mod error;
pub mod http;
pub mod merger;
pub mod probe;
pub mod progress;
pub mod retry;
pub mod segmenter;
pub mod store;
pub mod url_model;
