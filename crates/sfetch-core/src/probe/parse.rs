//! Parse HEAD response header lines.

/// Headers the downloader cares about, before validation.
#[derive(Debug, Default)]
pub(crate) struct RawHead {
    /// Parsed `Content-Length`, `None` when absent or not a valid integer.
    pub content_length: Option<u64>,
    /// True if `Accept-Ranges: bytes` was sent.
    pub accept_ranges: bool,
}

/// Folds raw header lines into `RawHead`. With redirects the lines of every
/// response are seen; a later header wins, so the final hop is what counts.
pub(crate) fn parse_head_lines(lines: &[String]) -> RawHead {
    let mut head = RawHead::default();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                head.content_length = value.parse::<u64>().ok();
            }
            if name.eq_ignore_ascii_case("accept-ranges") {
                head.accept_ranges = value.eq_ignore_ascii_case("bytes");
            }
        }
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn content_length_and_ranges() {
        let head = parse_head_lines(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 12345",
            "Accept-Ranges: bytes",
        ]));
        assert_eq!(head.content_length, Some(12345));
        assert!(head.accept_ranges);
    }

    #[test]
    fn missing_content_length() {
        let head = parse_head_lines(&lines(&["HTTP/1.1 200 OK", "Content-Type: video/mp4"]));
        assert_eq!(head.content_length, None);
    }

    #[test]
    fn non_integer_content_length() {
        let head = parse_head_lines(&lines(&["Content-Length: chunky"]));
        assert_eq!(head.content_length, None);
        let head = parse_head_lines(&lines(&["Content-Length: -5"]));
        assert_eq!(head.content_length, None);
    }

    #[test]
    fn accept_ranges_none_is_not_bytes() {
        let head = parse_head_lines(&lines(&["Content-Length: 10", "Accept-Ranges: none"]));
        assert_eq!(head.content_length, Some(10));
        assert!(!head.accept_ranges);
    }

    #[test]
    fn redirect_hop_headers_last_wins() {
        let head = parse_head_lines(&lines(&[
            "HTTP/1.1 302 Found",
            "Content-Length: 0",
            "HTTP/1.1 200 OK",
            "Content-Length: 999",
        ]));
        assert_eq!(head.content_length, Some(999));
    }
}
