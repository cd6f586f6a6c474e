//! Minimal HTTP/1.1 server that supports HEAD and Range GET for integration
//! tests.
//!
//! Serves a single static body and counts HEAD/GET requests so tests can
//! assert how many segment fetches were issued. Options simulate misbehaving
//! servers: missing Content-Length, ignored Range headers, a failing range,
//! a slow range.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// If false, HEAD omits Content-Length (simulates streaming endpoints).
    pub send_content_length: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// GETs whose Range starts at this offset are answered with HTTP 500.
    pub fail_get_at: Option<u64>,
    /// GETs whose Range starts at this offset are delayed before responding.
    pub delay_get_at: Option<(u64, Duration)>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            send_content_length: true,
            support_ranges: true,
            fail_get_at: None,
            delay_get_at: None,
        }
    }
}

/// Running server handle: base URL plus request counters.
pub struct ServerHandle {
    pub url: String,
    heads: Arc<AtomicUsize>,
    gets: Arc<AtomicUsize>,
}

impl ServerHandle {
    pub fn head_count(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body` at `/data.bin`.
/// The server runs until the process exits.
pub fn start(body: Vec<u8>) -> ServerHandle {
    start_with_options(body, ServerOptions::default())
}

/// Like `start` but with customized behavior.
pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> ServerHandle {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let heads = Arc::new(AtomicUsize::new(0));
    let gets = Arc::new(AtomicUsize::new(0));

    let heads_srv = Arc::clone(&heads);
    let gets_srv = Arc::clone(&gets);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let heads = Arc::clone(&heads_srv);
            let gets = Arc::clone(&gets_srv);
            thread::spawn(move || handle(stream, &body, opts, &heads, &gets));
        }
    });

    ServerHandle {
        url: format!("http://127.0.0.1:{}/data.bin", port),
        heads,
        gets,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    opts: ServerOptions,
    heads: &AtomicUsize,
    gets: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, range) = parse_request(request);
    let total = body.len() as u64;

    if method.eq_ignore_ascii_case("HEAD") {
        heads.fetch_add(1, Ordering::SeqCst);
        let mut response = String::from("HTTP/1.1 200 OK\r\n");
        if opts.send_content_length {
            response.push_str(&format!("Content-Length: {}\r\n", total));
        }
        if opts.support_ranges {
            response.push_str("Accept-Ranges: bytes\r\n");
        }
        response.push_str("\r\n");
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if method.eq_ignore_ascii_case("GET") {
        gets.fetch_add(1, Ordering::SeqCst);
        let range_start = range.map(|(start, _)| start);

        if let Some((at, delay)) = opts.delay_get_at {
            if range_start == Some(at) {
                thread::sleep(delay);
            }
        }
        if let Some(at) = opts.fail_get_at {
            if range_start == Some(at) {
                let _ = stream
                    .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n");
                return;
            }
        }

        let (status, content_range, slice) = match range.filter(|_| opts.support_ranges) {
            Some((start, end_incl)) => {
                let start = start.min(total);
                let end_incl = end_incl.min(total.saturating_sub(1));
                if start > end_incl {
                    (
                        "416 Range Not Satisfiable",
                        format!("bytes */{}", total),
                        &body[0..0],
                    )
                } else {
                    let start = start as usize;
                    let end_excl = (end_incl + 1).min(total) as usize;
                    (
                        "206 Partial Content",
                        format!("bytes {}-{}/{}", start, end_excl.saturating_sub(1), total),
                        &body[start..end_excl],
                    )
                }
            }
            None => (
                "200 OK",
                format!("bytes 0-{}/{}", total.saturating_sub(1), total),
                body,
            ),
        };

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Range: {}\r\n\r\n",
            status,
            slice.len(),
            content_range
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(slice);
        return;
    }

    let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\n\r\n");
}

/// Returns (method, optional (start, end_inclusive) for `Range: bytes=X-Y`).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, range)
}
