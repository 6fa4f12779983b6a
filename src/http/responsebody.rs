//! Response body collection for the multiplexed transport.

use crate::base::neterror::NetError;
use bytes::Bytes;
use flate2::read::GzDecoder;
use hyper::body::Incoming;
use std::io::Read;

/// Response body wrapper over hyper's incoming stream.
pub struct ResponseBody {
    inner: Incoming,
    gzip: bool,
}

impl ResponseBody {
    /// Wrap `inner`; `gzip` marks a `Content-Encoding: gzip` body.
    pub fn new(inner: Incoming, gzip: bool) -> Self {
        Self { inner, gzip }
    }

    /// Read entire body as bytes, decompressed if needed.
    pub async fn bytes(self) -> Result<Bytes, NetError> {
        use http_body_util::BodyExt;
        let collected = self
            .inner
            .collect()
            .await
            .map_err(|_| NetError::ConnectionClosed)?
            .to_bytes();

        if self.gzip {
            gunzip(&collected)
        } else {
            Ok(collected)
        }
    }
}

/// Decompress a gzip payload. An empty payload stays empty.
pub fn gunzip(data: &[u8]) -> Result<Bytes, NetError> {
    if data.is_empty() {
        return Ok(Bytes::new());
    }
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|_| NetError::ContentDecodingFailed)?;
    Ok(Bytes::from(out))
}
