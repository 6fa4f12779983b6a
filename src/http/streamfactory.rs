use crate::base::neterror::NetError;
use crate::http::rawrequest::RequestTarget;
use crate::http::requestspec::RequestSpec;
use crate::socket::connectjob::ConnectJob;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::spawn;
use url::Url;

/// One HTTP/1.1 connection driven by hyper.
/// Equivalent to net::HttpStream.
pub struct HttpStream {
    sender: http1::SendRequest<Full<Bytes>>,
    target: RequestTarget,
}

impl HttpStream {
    /// How requests on this stream must address their target.
    pub fn target(&self) -> RequestTarget {
        self.target
    }

    pub async fn send_request(
        &mut self,
        req: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, NetError> {
        self.sender.send_request(req).await.map_err(|e| {
            tracing::debug!(error = %e, "request failed");
            if e.is_timeout() {
                NetError::TimedOut
            } else if e.is_parse() {
                NetError::InvalidResponse
            } else {
                NetError::ConnectionClosed
            }
        })
    }
}

pub struct HttpStreamFactory;

impl HttpStreamFactory {
    /// Open a fresh connection for `url` and hand it to hyper.
    pub async fn request_stream(url: &Url, spec: &RequestSpec) -> Result<HttpStream, NetError> {
        let conn = ConnectJob::connect(url, spec).await?;
        let io = TokioIo::new(conn.socket);

        let (sender, connection) = http1::Builder::new()
            .title_case_headers(true)
            .handshake(io)
            .await
            .map_err(|_| NetError::ConnectionFailed)?;

        spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "connection closed with error");
            }
        });

        Ok(HttpStream {
            sender,
            target: conn.target,
        })
    }
}
