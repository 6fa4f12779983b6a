//! Raw HTTP/1.x response decoding.
//!
//! Splits a response read to EOF into status code, header lines and body,
//! reassembling chunked bodies on the way.

use crate::http::chunked::decode_chunked_lenient;
use bytes::Bytes;
use std::time::Duration;

/// Normalized response record shared by both transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    /// `0` when the status line is missing or unparseable.
    pub status_code: u16,
    pub body: Bytes,
    /// Header lines in wire order, without the status line.
    pub header_lines: Vec<String>,
    pub elapsed: Duration,
}

impl DecodedResponse {
    /// Synthetic failure: code 0, empty body, no headers.
    pub fn failure(elapsed: Duration) -> Self {
        Self {
            status_code: 0,
            body: Bytes::new(),
            header_lines: Vec::new(),
            elapsed,
        }
    }

    /// Iterate parsed `(name, value)` header pairs.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header_lines.iter().filter_map(|l| parse_header_line(l))
    }

    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location").filter(|v| !v.is_empty())
    }

    /// `name=value` part of every `Set-Cookie` line.
    pub fn set_cookie_pairs(&self) -> Vec<&str> {
        self.headers()
            .filter(|(n, _)| n.eq_ignore_ascii_case("set-cookie"))
            .map(|(_, v)| v.split(';').next().unwrap_or("").trim())
            .filter(|pair| !pair.is_empty())
            .collect()
    }
}

/// Split a `Name: value` line. The name must be a run of `[A-Za-z0-9-]`.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return None;
    }
    Some((name, value.trim()))
}

/// Parse `HTTP/1.1 <code> ...` or `HTTP/1.0 <code> ...`.
pub fn parse_status_line(line: &str) -> Option<u16> {
    let rest = line
        .strip_prefix("HTTP/1.1 ")
        .or_else(|| line.strip_prefix("HTTP/1.0 "))?;
    let code = rest.split_whitespace().next()?;
    if code.len() != 3 {
        return None;
    }
    code.parse().ok()
}

pub struct ResponseDecoder;

impl ResponseDecoder {
    /// Decode a full response byte stream.
    pub fn decode(raw: &[u8], elapsed: Duration) -> DecodedResponse {
        let (head, body) = match raw.windows(4).position(|w| w == b"\r\n\r\n") {
            Some(idx) => (&raw[..idx], &raw[idx + 4..]),
            None => (raw, &raw[raw.len()..]),
        };

        let head = String::from_utf8_lossy(head);
        let mut lines = head.split("\r\n");
        let status_code = lines
            .next()
            .and_then(parse_status_line)
            .unwrap_or(0);
        let header_lines: Vec<String> = lines
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        let chunked = header_lines.iter().filter_map(|l| parse_header_line(l)).any(
            |(n, v)| {
                n.eq_ignore_ascii_case("transfer-encoding")
                    && v.to_ascii_lowercase().contains("chunked")
            },
        );

        let body = if chunked {
            decode_chunked_lenient(body)
        } else {
            Bytes::copy_from_slice(body)
        };

        DecodedResponse {
            status_code,
            body,
            header_lines,
            elapsed,
        }
    }
}
