//! `Transfer-Encoding: chunked` reassembly for raw socket responses.

use crate::base::neterror::NetError;
use bytes::{Bytes, BytesMut};

/// Decode a complete chunked body.
///
/// Each chunk is a hex size line (extensions after `;` ignored), the
/// payload and a CRLF. Decoding stops at the zero-size chunk; trailers
/// after it are dropped. A stream that ends without the terminating chunk
/// yields the payload read so far.
pub fn decode_chunked(raw: &[u8]) -> Result<Bytes, NetError> {
    let mut out = BytesMut::with_capacity(raw.len());
    let mut pos = 0usize;

    while pos < raw.len() {
        let line_end = find_crlf(&raw[pos..]).ok_or(NetError::InvalidChunkedEncoding)?;
        let size_line =
            std::str::from_utf8(&raw[pos..pos + line_end]).map_err(|_| NetError::InvalidChunkedEncoding)?;
        let size_str = size_line.split(';').next().unwrap_or("").trim();
        let size =
            usize::from_str_radix(size_str, 16).map_err(|_| NetError::InvalidChunkedEncoding)?;
        pos += line_end + 2;

        if size == 0 {
            return Ok(out.freeze());
        }

        let end = pos.checked_add(size).ok_or(NetError::InvalidChunkedEncoding)?;
        if end > raw.len() {
            return Err(NetError::InvalidChunkedEncoding);
        }
        out.extend_from_slice(&raw[pos..end]);
        pos = end;

        // Chunk payload is followed by CRLF
        if raw[pos..].starts_with(b"\r\n") {
            pos += 2;
        } else if pos < raw.len() {
            return Err(NetError::InvalidChunkedEncoding);
        }
    }

    Ok(out.freeze())
}

/// Decode what can be decoded, keeping the prefix on malformed input.
pub fn decode_chunked_lenient(raw: &[u8]) -> Bytes {
    match decode_chunked(raw) {
        Ok(body) => body,
        Err(_) => {
            tracing::warn!(len = raw.len(), "malformed chunked body, keeping decoded prefix");
            decode_prefix(raw)
        }
    }
}

fn decode_prefix(raw: &[u8]) -> Bytes {
    let mut out = BytesMut::new();
    let mut pos = 0usize;
    while let Some(line_end) = find_crlf(&raw[pos..]) {
        let size = std::str::from_utf8(&raw[pos..pos + line_end])
            .ok()
            .and_then(|l| usize::from_str_radix(l.split(';').next().unwrap_or("").trim(), 16).ok());
        let Some(size) = size.filter(|s| *s > 0) else {
            break;
        };
        pos += line_end + 2;
        let Some(end) = pos.checked_add(size) else {
            break;
        };
        let end = end.min(raw.len());
        if end < pos {
            break;
        }
        out.extend_from_slice(&raw[pos..end]);
        pos = end;
        if raw[pos..].starts_with(b"\r\n") {
            pos += 2;
        } else {
            break;
        }
    }
    out.freeze()
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wikipedia() {
        let raw = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        assert_eq!(decode_chunked(raw).unwrap(), Bytes::from("Wikipedia"));
    }

    #[test]
    fn test_missing_terminator() {
        let raw = b"4\r\nWiki\r\n5\r\npedia\r\n";
        assert_eq!(decode_chunked(raw).unwrap(), Bytes::from("Wikipedia"));
    }

    #[test]
    fn test_extensions_and_trailers() {
        let raw = b"a;name=value\r\n0123456789\r\n0\r\nX-Trailer: yes\r\n\r\n";
        assert_eq!(decode_chunked(raw).unwrap(), Bytes::from("0123456789"));
    }

    #[test]
    fn test_payload_with_crlf_inside() {
        let raw = b"6\r\na\r\nb\r\n\r\n0\r\n\r\n";
        assert_eq!(decode_chunked(raw).unwrap(), Bytes::from("a\r\nb\r\n"));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(decode_chunked(b"0\r\n\r\n").unwrap(), Bytes::new());
        assert_eq!(decode_chunked(b"").unwrap(), Bytes::new());
    }

    #[test]
    fn test_invalid_size() {
        assert_eq!(
            decode_chunked(b"zz\r\nWiki\r\n"),
            Err(NetError::InvalidChunkedEncoding)
        );
    }

    #[test]
    fn test_truncated_chunk() {
        assert_eq!(
            decode_chunked(b"10\r\nshort"),
            Err(NetError::InvalidChunkedEncoding)
        );
    }

    #[test]
    fn test_lenient_keeps_prefix() {
        let raw = b"4\r\nWiki\r\n5\r\npe";
        assert_eq!(decode_chunked_lenient(raw), Bytes::from("Wikipe"));
    }

    #[test]
    fn test_lenient_oversized_chunk() {
        let raw = b"4\r\nWiki\r\nffffffffffffffff\r\nxyz";
        assert_eq!(
            decode_chunked(raw),
            Err(NetError::InvalidChunkedEncoding)
        );
        assert_eq!(decode_chunked_lenient(raw), Bytes::from("Wiki"));
    }
}
