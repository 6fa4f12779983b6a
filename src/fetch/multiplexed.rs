//! Concurrent transport over hyper HTTP/1.1 connections.
//!
//! Every admitted URL runs as its own task in a [`JoinSet`]; the run loop
//! waits on whichever finishes first, records it and admits the next
//! backlog URL into the freed slot. Redirects are followed inside the
//! transfer, the way a follow-location option would.

use crate::base::neterror::NetError;
use crate::fetch::outcome::TaskOutcome;
use crate::fetch::scheduler::TaskQueue;
use crate::fetch::task::TaskId;
use crate::fetch::transport::{Running, Transport, TransportKind};
use crate::http::decoder::DecodedResponse;
use crate::http::mime::MimeResolve;
use crate::http::orderedheaders::{title_case, HeaderList};
use crate::http::rawrequest::{absolute_form, origin_form, RequestTarget};
use crate::http::redirect::{RedirectChain, RedirectDecision, RedirectResolver};
use crate::http::requestbody::RequestBody;
use crate::http::requestspec::{host_header_value, RequestSpec};
use crate::http::responsebody::ResponseBody;
use crate::http::streamfactory::HttpStreamFactory;
use bytes::Bytes;
use http::header::CONTENT_ENCODING;
use http::{HeaderMap, Request};
use http_body_util::Full;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// `Accept` sent unless the caller overrides it.
const NATIVE_ACCEPT: &str = "*/*";

pub struct MultiplexedTransport {
    mime: Arc<dyn MimeResolve>,
}

impl MultiplexedTransport {
    pub fn new(mime: Arc<dyn MimeResolve>) -> Self {
        Self { mime }
    }

    async fn drive(&self, queue: &mut TaskQueue, spec: Arc<RequestSpec>) -> Result<(), NetError> {
        let mut set: JoinSet<(TaskId, TaskOutcome)> = JoinSet::new();
        self.fill(queue, &mut set, &spec);

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((id, outcome)) => {
                    queue.complete(id, outcome);
                    self.fill(queue, &mut set, &spec);
                }
                Err(e) => {
                    let dropped = queue.abort_in_flight();
                    set.abort_all();
                    tracing::error!(
                        error = %e,
                        in_flight = dropped,
                        backlog = queue.backlog_len(),
                        "transfer loop aborted"
                    );
                    return Err(NetError::MultiplexAborted);
                }
            }
        }
        Ok(())
    }

    /// Spawn transfers until the window is full or the backlog is empty.
    fn fill(
        &self,
        queue: &mut TaskQueue,
        set: &mut JoinSet<(TaskId, TaskOutcome)>,
        spec: &Arc<RequestSpec>,
    ) {
        while let Some((id, url)) = queue.admit() {
            let spec = Arc::clone(spec);
            let mime = Arc::clone(&self.mime);
            let handle = set.spawn(async move {
                let outcome = transfer(&url, &spec, mime.as_ref()).await;
                (id, outcome)
            });
            queue.set_abort_handle(id, handle);
        }
    }
}

impl Transport for MultiplexedTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Multiplexed
    }

    fn run<'a>(&'a self, queue: &'a mut TaskQueue, spec: Arc<RequestSpec>) -> Running<'a> {
        Box::pin(self.drive(queue, spec))
    }
}

/// One URL from first byte to terminal outcome, under the total timeout.
async fn transfer(url: &str, spec: &RequestSpec, mime: &dyn MimeResolve) -> TaskOutcome {
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
    let mut auto_referer: Option<String> = None;
    let resolver = RedirectResolver::native();

    loop {
        let body = RequestBody::for_target(spec, &body_key, mime).await?;
        let mut stream = HttpStreamFactory::request_stream(&url, spec).await?;
        let request = build_request(spec, &url, body, auto_referer.as_deref(), stream.target())?;

        let (parts, incoming) = stream.send_request(request).await?.into_parts();
        let gzip = parts
            .headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"));
        let body = ResponseBody::new(incoming, gzip).bytes().await?;

        let decoded = DecodedResponse {
            status_code: parts.status.as_u16(),
            body,
            header_lines: render_header_lines(&parts.headers),
            elapsed: started.elapsed(),
        };

        match resolver.resolve(&decoded, &url, &mut chain) {
            RedirectDecision::Terminal => return Ok(TaskOutcome::Response(decoded)),
            RedirectDecision::LimitExceeded => {
                return Ok(TaskOutcome::RedirectLimitExceeded {
                    elapsed: started.elapsed(),
                })
            }
            RedirectDecision::Follow { target, .. } => {
                auto_referer = Some(absolute_form(&url));
                body_key = target.to_string();
                url = target;
            }
        }
    }
}

/// Build the hyper request for one hop.
fn build_request(
    spec: &RequestSpec,
    url: &Url,
    body: RequestBody,
    auto_referer: Option<&str>,
    target: RequestTarget,
) -> Result<Request<Full<Bytes>>, NetError> {
    let mut headers = HeaderList::new();
    headers.insert("Host", &host_header_value(url)?)?;
    headers.insert("Accept", NATIVE_ACCEPT)?;
    headers.insert("Accept-Encoding", "gzip")?;
    if !spec.user_agent.is_empty() {
        headers.insert("User-Agent", &spec.user_agent)?;
    }
    if let Some(referer) = spec.referer.as_deref().or(auto_referer) {
        headers.insert("Referer", referer)?;
    }
    if let Some(cookie) = spec.cookie_header(None) {
        headers.insert("Cookie", &cookie)?;
    }
    if let Some(auth) = &spec.authorization {
        headers.insert("Authorization", auth)?;
    }
    if target == RequestTarget::Absolute {
        if let Some(auth) = spec.proxy.as_ref().and_then(|p| p.get_auth_header()) {
            headers.insert("Proxy-Authorization", &auth)?;
        }
    }
    for (name, value) in spec.headers.iter() {
        headers.insert(name, value)?;
    }
    if let Some(content_type) = body.content_type() {
        headers.insert("Content-Type", content_type)?;
        headers.insert("Content-Length", &body.len().to_string())?;
    }

    let uri = match target {
        RequestTarget::Origin => origin_form(url),
        RequestTarget::Absolute => absolute_form(url),
    };

    let mut builder = Request::builder().method(spec.method.clone()).uri(uri);
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
        .body(Full::new(body.into_bytes()))
        .map_err(|_| NetError::InvalidUrl)
}

/// Response headers as `Name: value` lines in title case.
fn render_header_lines(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                title_case(name.as_str()),
                String::from_utf8_lossy(value.as_bytes())
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_build_request_headers() {
        let spec = RequestSpec::builder(Method::GET)
            .header("Accept", "text/plain")
            .cookie("a=1")
            .build()
            .unwrap();
        let url = Url::parse("http://example.com:8080/x?y=1").unwrap();
        let req = build_request(&spec, &url, RequestBody::Empty, Some("http://prev/"), RequestTarget::Origin)
            .unwrap();

        assert_eq!(req.uri(), "/x?y=1");
        assert_eq!(req.headers()["host"], "example.com:8080");
        assert_eq!(req.headers()["accept"], "text/plain");
        assert_eq!(req.headers()["accept-encoding"], "gzip");
        assert_eq!(req.headers()["referer"], "http://prev/");
        assert_eq!(req.headers()["cookie"], "a=1");
        assert!(req.headers().get("content-type").is_none());
    }

    #[test]
    fn test_explicit_referer_wins() {
        let spec = RequestSpec::builder(Method::GET)
            .referer("http://mine/")
            .build()
            .unwrap();
        let url = Url::parse("http://example.com/").unwrap();
        let req = build_request(&spec, &url, RequestBody::Empty, Some("http://prev/"), RequestTarget::Origin)
            .unwrap();
        assert_eq!(req.headers()["referer"], "http://mine/");
    }

    #[test]
    fn test_absolute_uri_for_forward_proxy() {
        let spec = RequestSpec::builder(Method::POST).build().unwrap();
        let url = Url::parse("http://example.com/submit").unwrap();
        let body = RequestBody::Form(Bytes::from("a=1"));
        let req = build_request(&spec, &url, body, None, RequestTarget::Absolute).unwrap();

        assert_eq!(req.uri(), "http://example.com/submit");
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.headers()["content-length"], "3");
    }

    #[test]
    fn test_render_header_lines() {
        let mut map = HeaderMap::new();
        map.insert("content-type", "text/html".parse().unwrap());
        map.append("set-cookie", "a=1".parse().unwrap());
        map.append("set-cookie", "b=2".parse().unwrap());
        let lines = render_header_lines(&map);
        assert!(lines.contains(&"Content-Type: text/html".to_string()));
        assert!(lines.contains(&"Set-Cookie: a=1".to_string()));
        assert!(lines.contains(&"Set-Cookie: b=2".to_string()));
    }
}
