//! HTTP/1.1 request framing for the raw socket transport.

use crate::base::neterror::NetError;
use crate::http::orderedheaders::HeaderList;
use crate::http::requestbody::RequestBody;
use crate::http::requestspec::{host_header_value, RequestSpec};
use bytes::{BufMut, Bytes, BytesMut};
use url::Url;

/// `Accept` sent unless the caller overrides it.
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// How the request line addresses the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTarget {
    /// `path?query`
    Origin,
    /// Full URL, for plain HTTP through a proxy.
    Absolute,
}

/// Frame `METHOD target HTTP/1.1`, headers, blank line and body.
///
/// Headers go out as Host, Accept, Connection, then the optional
/// Authorization, User-Agent, Referer, Cookie and Proxy-Authorization,
/// then caller headers (replacing same-named defaults), then
/// Content-Type and Content-Length when there is a body.
pub fn build_request(
    spec: &RequestSpec,
    url: &Url,
    body: RequestBody,
    cookie_override: Option<&str>,
    target: RequestTarget,
) -> Result<Bytes, NetError> {
    let mut headers = HeaderList::new();
    headers.insert("Host", &host_header_value(url)?)?;
    headers.insert("Accept", DEFAULT_ACCEPT)?;
    headers.insert("Connection", "Close")?;
    if let Some(auth) = &spec.authorization {
        headers.insert("Authorization", auth)?;
    }
    if !spec.user_agent.is_empty() {
        headers.insert("User-Agent", &spec.user_agent)?;
    }
    if let Some(referer) = &spec.referer {
        headers.insert("Referer", referer)?;
    }
    if let Some(cookie) = spec.cookie_header(cookie_override) {
        headers.insert("Cookie", &cookie)?;
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

    let request_target = match target {
        RequestTarget::Origin => origin_form(url),
        RequestTarget::Absolute => absolute_form(url),
    };

    let body = body.into_bytes();
    let mut out = BytesMut::with_capacity(256 + body.len());
    out.put_slice(format!("{} {} HTTP/1.1\r\n", spec.method, request_target).as_bytes());
    for (name, value) in headers.iter() {
        out.put_slice(name.as_bytes());
        out.put_slice(b": ");
        out.put_slice(value.as_bytes());
        out.put_slice(b"\r\n");
    }
    out.put_slice(b"\r\n");
    out.put_slice(&body);
    Ok(out.freeze())
}

/// `path?query`, `/` when the path is empty.
pub fn origin_form(url: &Url) -> String {
    let path = if url.path().is_empty() { "/" } else { url.path() };
    match url.query() {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    }
}

/// URL without fragment.
pub fn absolute_form(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}
