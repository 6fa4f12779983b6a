//! Raw socket transport.
//!
//! URLs are admitted into the window like any other transport, but each
//! one is executed to completion (connect, write, read to EOF) before the
//! next starts. Redirects go through [`RedirectResolver::socket`], which
//! follows any `Location` and carries the hop's `Set-Cookie` values into
//! the next request only.

use crate::base::neterror::NetError;
use crate::fetch::outcome::TaskOutcome;
use crate::fetch::scheduler::TaskQueue;
use crate::fetch::task::TaskId;
use crate::fetch::transport::{Running, Transport, TransportKind};
use crate::http::decoder::{DecodedResponse, ResponseDecoder};
use crate::http::mime::MimeResolve;
use crate::http::rawrequest::build_request;
use crate::http::redirect::{RedirectChain, RedirectDecision, RedirectResolver};
use crate::http::requestbody::RequestBody;
use crate::http::requestspec::RequestSpec;
use crate::socket::client::SocketType;
use crate::socket::connectjob::ConnectJob;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use url::Url;

const READ_CHUNK: usize = 8192;

pub struct SequentialTransport {
    mime: Arc<dyn MimeResolve>,
}

impl SequentialTransport {
    pub fn new(mime: Arc<dyn MimeResolve>) -> Self {
        Self { mime }
    }

    async fn drive(&self, queue: &mut TaskQueue, spec: Arc<RequestSpec>) -> Result<(), NetError> {
        let mut window: VecDeque<(TaskId, String)> = VecDeque::new();
        loop {
            while let Some(task) = queue.admit() {
                window.push_back(task);
            }
            let Some((id, url)) = window.pop_front() else {
                break;
            };
            let outcome = execute(&url, &spec, self.mime.as_ref()).await;
            queue.complete(id, outcome);
        }
        Ok(())
    }
}

impl Transport for SequentialTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Sequential
    }

    fn run<'a>(&'a self, queue: &'a mut TaskQueue, spec: Arc<RequestSpec>) -> Running<'a> {
        Box::pin(self.drive(queue, spec))
    }
}

async fn execute(url: &str, spec: &RequestSpec, mime: &dyn MimeResolve) -> TaskOutcome {
    let started = Instant::now();
    let result = match spec.timeouts.total {
        Some(limit) => tokio::time::timeout(limit, follow(url, spec, mime, started))
            .await
            .unwrap_or(Err(NetError::TimedOut)),
        None => follow(url, spec, mime, started).await,
    };

    result.unwrap_or_else(|error| TaskOutcome::Failed {
        error,
        elapsed: started.elapsed(),
    })
}

async fn follow(
    original: &str,
    spec: &RequestSpec,
    mime: &dyn MimeResolve,
    started: Instant,
) -> Result<TaskOutcome, NetError> {
    let mut url = Url::parse(original).map_err(|_| NetError::InvalidUrl)?;
    let mut body_key = original.to_string();
    let mut chain = RedirectChain::new();
    let mut cookie_override: Option<String> = None;
    let resolver = RedirectResolver::socket();

    loop {
        let decoded = fetch_once(&url, &body_key, spec, mime, cookie_override.as_deref(), started).await?;

        match resolver.resolve(&decoded, &url, &mut chain) {
            RedirectDecision::Terminal => return Ok(TaskOutcome::Response(decoded)),
            RedirectDecision::LimitExceeded => {
                return Ok(TaskOutcome::RedirectLimitExceeded {
                    elapsed: started.elapsed(),
                })
            }
            RedirectDecision::Follow { target, cookie } => {
                // Applies to the next hop only
                cookie_override = cookie;
                body_key = target.to_string();
                url = target;
            }
        }
    }
}

/// One request on a fresh connection, read until the peer closes.
async fn fetch_once(
    url: &Url,
    body_key: &str,
    spec: &RequestSpec,
    mime: &dyn MimeResolve,
    cookie_override: Option<&str>,
    started: Instant,
) -> Result<DecodedResponse, NetError> {
    let body = RequestBody::for_target(spec, body_key, mime).await?;
    let conn = ConnectJob::connect(url, spec).await?;
    let request = build_request(spec, url, body, cookie_override, conn.target)?;

    let raw = exchange(conn.socket, &request).await?;
    if raw.is_empty() {
        return Err(NetError::EmptyResponse);
    }
    Ok(ResponseDecoder::decode(&raw, started.elapsed()))
}

async fn exchange(mut socket: SocketType, request: &[u8]) -> Result<Vec<u8>, NetError> {
    socket.write_all(request).await?;
    socket.flush().await?;

    let mut raw = Vec::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            // Peers often close TLS without close_notify once the body is sent
            Err(e) if !raw.is_empty() => {
                tracing::debug!(error = %e, received = raw.len(), "read ended with error after data");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(raw)
}
