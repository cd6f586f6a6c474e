//! CLI for the sfetch segmented downloader.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use sfetch_core::config;
use sfetch_core::downloader::{self, DownloadOptions, DownloadRequest};
use sfetch_core::progress::{ProgressEvent, ProgressTracker};
use sfetch_core::url_model;

/// Top-level CLI for the sfetch downloader.
#[derive(Debug, Parser)]
#[command(name = "sfetch")]
#[command(about = "sfetch: concurrent segmented file downloader", long_about = None)]
pub struct Cli {
    /// Direct HTTP/HTTPS URL to download. Read from stdin when omitted.
    pub url: Option<String>,

    /// Number of parallel segments (overrides the config default).
    #[arg(long, value_name = "N")]
    pub segments: Option<usize>,

    /// Output file path (default: the URL's last path segment).
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

pub fn run_from_args() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);

    let url = match cli.url {
        Some(url) => url,
        None => read_url_from_stdin()?,
    };
    let target_path = cli
        .out
        .unwrap_or_else(|| PathBuf::from(url_model::default_target_name(&url)));
    let segment_count = cli.segments.unwrap_or(cfg.segment_count);

    let request = DownloadRequest {
        url,
        target_path,
        segment_count,
    };
    let options = DownloadOptions::from_config(&cfg);

    let (tx, rx) = mpsc::channel();
    let printer = thread::spawn(move || print_progress(rx));
    let result = downloader::run(&request, &options, Some(&tx));
    drop(tx);
    let _ = printer.join();

    let outcome = result.with_context(|| format!("download of {} failed", request.url))?;
    println!(
        "Downloaded {} bytes to {} in {:.2}s",
        outcome.total_bytes,
        request.target_path.display(),
        outcome.elapsed.as_secs_f64()
    );
    Ok(())
}

fn print_progress(rx: mpsc::Receiver<ProgressEvent>) {
    let mut tracker = ProgressTracker::new();
    for event in rx {
        tracker.apply(&event);
        match event {
            ProgressEvent::Probed { total_bytes } => {
                println!("Resource size: {} bytes", total_bytes);
            }
            ProgressEvent::SegmentDone { index } => {
                println!(
                    "Segment {} done ({}/{} bytes, {:.0}%)",
                    index,
                    tracker.bytes_done(),
                    tracker.total_bytes(),
                    tracker.fraction() * 100.0
                );
            }
            _ => {}
        }
    }
}

fn read_url_from_stdin() -> Result<String> {
    println!("Paste the URL to download:");
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed to read URL from stdin")?;
    let url = line.trim().to_string();
    anyhow::ensure!(!url.is_empty(), "no URL given");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn parses_url_and_flags() {
        let cli = Cli::try_parse_from([
            "sfetch",
            "https://example.com/f.bin",
            "--segments",
            "8",
            "--out",
            "local.bin",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://example.com/f.bin"));
        assert_eq!(cli.segments, Some(8));
        assert_eq!(cli.out.as_deref(), Some(Path::new("local.bin")));
    }

    #[test]
    fn url_is_optional() {
        let cli = Cli::try_parse_from(["sfetch"]).unwrap();
        assert!(cli.url.is_none());
        assert!(cli.segments.is_none());
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
