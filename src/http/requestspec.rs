//! Immutable per-call request description.
//!
//! A [`RequestSpec`] is frozen by [`RequestSpecBuilder::build`] before a
//! batch is dispatched and is only ever read afterwards, shared between
//! tasks behind an `Arc`. Anything that varies per hop (the redirect
//! cookie override) is passed alongside it, never written into it.

use crate::base::neterror::NetError;
use crate::http::orderedheaders::HeaderList;
use crate::socket::proxy::{basic_credentials, ProxySettings};
use http::Method;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::form_urlencoded;
use url::Url;

/// Connect timeout applied when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(3000);
/// Total per-transfer timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` value.
pub fn default_user_agent() -> String {
    format!("fetchnet/{}", env!("CARGO_PKG_VERSION"))
}

/// Outbound cookie, either verbatim or as name/value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSpec {
    Raw(String),
    Pairs(Vec<(String, String)>),
}

impl CookieSpec {
    /// Value for the `Cookie` header. Pairs are url-encoded and joined by `;`.
    pub fn header_value(&self) -> String {
        match self {
            CookieSpec::Raw(s) => s.clone(),
            CookieSpec::Pairs(pairs) => pairs
                .iter()
                .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

impl From<&str> for CookieSpec {
    fn from(s: &str) -> Self {
        CookieSpec::Raw(s.to_string())
    }
}

impl From<String> for CookieSpec {
    fn from(s: String) -> Self {
        CookieSpec::Raw(s)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for CookieSpec {
    fn from(pairs: Vec<(K, V)>) -> Self {
        CookieSpec::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Body data for one URL: an already-encoded string or form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostData {
    Raw(String),
    Fields(Vec<(String, String)>),
}

impl PostData {
    /// `application/x-www-form-urlencoded` rendition.
    pub fn encode(&self) -> String {
        match self {
            PostData::Raw(s) => s.clone(),
            PostData::Fields(fields) => form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter())
                .finish(),
        }
    }

    /// Field list; raw data is parsed as a query string.
    pub fn fields(&self) -> Vec<(String, String)> {
        match self {
            PostData::Raw(s) => form_urlencoded::parse(s.as_bytes())
                .into_owned()
                .collect(),
            PostData::Fields(fields) => fields.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PostData::Raw(s) => s.is_empty(),
            PostData::Fields(fields) => fields.is_empty(),
        }
    }
}

impl From<&str> for PostData {
    fn from(s: &str) -> Self {
        PostData::Raw(s.to_string())
    }
}

impl From<String> for PostData {
    fn from(s: String) -> Self {
        PostData::Raw(s)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for PostData {
    fn from(fields: Vec<(K, V)>) -> Self {
        PostData::Fields(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Connect and total timeouts for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    /// `None` disables the total timeout.
    pub total: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            total: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Everything needed to issue the same request against many URLs.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub headers: HeaderList,
    pub user_agent: String,
    pub referer: Option<String>,
    pub cookie: Option<CookieSpec>,
    /// Full `Authorization` header value.
    pub authorization: Option<String>,
    /// Per-URL request bodies keyed by the URL string as submitted.
    pub bodies: HashMap<String, PostData>,
    /// Upload files as (field name, path), in insertion order.
    pub files: Vec<(String, PathBuf)>,
    pub proxy: Option<ProxySettings>,
    pub ip_override: Option<String>,
    pub timeouts: Timeouts,
}

impl RequestSpec {
    pub fn builder(method: Method) -> RequestSpecBuilder {
        RequestSpecBuilder::new(method)
    }

    /// Body data registered for `url`, if any.
    pub fn body_for(&self, url: &str) -> Option<&PostData> {
        self.bodies.get(url)
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Cookie header value, honoring a per-hop override.
    pub fn cookie_header(&self, cookie_override: Option<&str>) -> Option<String> {
        match cookie_override {
            Some(c) => Some(c.to_string()),
            None => self.cookie.as_ref().map(CookieSpec::header_value),
        }
    }
}

/// Builder for [`RequestSpec`].
///
/// Setters never fail; the first invalid input is reported by [`build`](Self::build).
#[derive(Debug)]
pub struct RequestSpecBuilder {
    spec: RequestSpec,
    error: Option<NetError>,
}

impl RequestSpecBuilder {
    pub fn new(method: Method) -> Self {
        Self {
            spec: RequestSpec {
                method,
                headers: HeaderList::new(),
                user_agent: default_user_agent(),
                referer: None,
                cookie: None,
                authorization: None,
                bodies: HashMap::new(),
                files: Vec::new(),
                proxy: None,
                ip_override: None,
                timeouts: Timeouts::default(),
            },
            error: None,
        }
    }

    fn record(&mut self, result: Result<(), NetError>) {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
    }

    /// Set a header; a later call with the same name replaces the value.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let result = self.spec.headers.insert(name, value);
        self.record(result);
        self
    }

    /// Set a header from a raw `Name: value` line.
    pub fn header_line(mut self, line: &str) -> Self {
        let result = self.spec.headers.insert_line(line);
        self.record(result);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.spec.user_agent = ua.into();
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.spec.referer = Some(referer.into());
        self
    }

    pub fn cookie(mut self, cookie: impl Into<CookieSpec>) -> Self {
        self.spec.cookie = Some(cookie.into());
        self
    }

    pub fn basic_auth(mut self, user: &str, pass: &str) -> Self {
        self.spec.authorization = Some(basic_credentials(user, pass));
        self
    }

    pub fn body_for(mut self, url: impl Into<String>, data: impl Into<PostData>) -> Self {
        self.spec.bodies.insert(url.into(), data.into());
        self
    }

    /// Attach a file; a later call with the same field replaces the path.
    pub fn file(mut self, path: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        let field = field.into();
        let path = path.into();
        if let Some(slot) = self.spec.files.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = path;
        } else {
            self.spec.files.push((field, path));
        }
        self
    }

    pub fn proxy(mut self, proxy: Option<ProxySettings>) -> Self {
        self.spec.proxy = proxy;
        self
    }

    pub fn ip_override(mut self, ip: impl Into<String>) -> Self {
        self.spec.ip_override = Some(ip.into());
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.spec.timeouts = timeouts;
        self
    }

    pub fn build(self) -> Result<RequestSpec, NetError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.spec),
        }
    }
}

/// `Host` header value: host name plus `:port` unless the port is the scheme default.
pub fn host_header_value(url: &Url) -> Result<String, NetError> {
    let host = url.host_str().ok_or(NetError::InvalidUrl)?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn encode_component(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_last_write_wins() {
        let spec = RequestSpec::builder(Method::GET)
            .header("X-Test", "a")
            .header_line("x-test: b")
            .build()
            .unwrap();

        assert_eq!(spec.headers.len(), 1);
        assert_eq!(spec.headers.get("X-Test"), Some("b"));
    }

    #[test]
    fn test_invalid_header_fails_build() {
        let result = RequestSpec::builder(Method::GET)
            .header_line("broken")
            .header("X-Ok", "fine")
            .build();
        assert_eq!(result.unwrap_err(), NetError::InvalidHeader);
    }

    #[test]
    fn test_cookie_pairs_joined() {
        let cookie = CookieSpec::from(vec![("a", "1"), ("b", "x y")]);
        assert_eq!(cookie.header_value(), "a=1;b=x+y");

        let raw = CookieSpec::from("sid=abc; lang=en");
        assert_eq!(raw.header_value(), "sid=abc; lang=en");
    }

    #[test]
    fn test_cookie_override_wins() {
        let spec = RequestSpec::builder(Method::GET)
            .cookie("a=1")
            .build()
            .unwrap();
        assert_eq!(spec.cookie_header(None).as_deref(), Some("a=1"));
        assert_eq!(spec.cookie_header(Some("b=2")).as_deref(), Some("b=2"));
    }

    #[test]
    fn test_post_data_encoding() {
        let data = PostData::from(vec![("name", "a b"), ("x", "1&2")]);
        assert_eq!(data.encode(), "name=a+b&x=1%262");

        let raw = PostData::from("k=v&z=%20");
        assert_eq!(raw.encode(), "k=v&z=%20");
        assert_eq!(
            raw.fields(),
            vec![("k".to_string(), "v".to_string()), ("z".to_string(), " ".to_string())]
        );
    }

    #[test]
    fn test_file_field_replaced() {
        let spec = RequestSpec::builder(Method::POST)
            .file("/tmp/a.png", "img")
            .file("/tmp/b.png", "img")
            .file("/tmp/c.txt", "doc")
            .build()
            .unwrap();
        assert_eq!(spec.files.len(), 2);
        assert_eq!(spec.files[0].1, PathBuf::from("/tmp/b.png"));
    }

    #[test]
    fn test_defaults() {
        let spec = RequestSpec::builder(Method::GET).build().unwrap();
        assert!(spec.user_agent.starts_with("fetchnet/"));
        assert_eq!(spec.timeouts.connect, Duration::from_millis(3000));
        assert_eq!(spec.timeouts.total, Some(Duration::from_secs(30)));
        assert!(spec.body_for("http://a/").is_none());
    }

    #[test]
    fn test_basic_auth() {
        let spec = RequestSpec::builder(Method::GET)
            .basic_auth("user", "pass")
            .build()
            .unwrap();
        assert_eq!(spec.authorization.as_deref(), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn test_host_header_value() {
        let url = Url::parse("http://example.com:8080/x").unwrap();
        assert_eq!(host_header_value(&url).unwrap(), "example.com:8080");
        let url = Url::parse("https://example.com:443/x").unwrap();
        assert_eq!(host_header_value(&url).unwrap(), "example.com");
    }
}
