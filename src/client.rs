//! HTTP Client with builder pattern.
//!
//! Every call takes one URL or a batch of URLs. Batches are deduplicated,
//! dispatched under the client's concurrency limit and returned as a map
//! keyed by the URL strings as submitted.
//!
//! # Example
//!
//! ```rust,ignore
//! use fetchnet::Client;
//!
//! let client = Client::builder()
//!     .concurrency_limit(4)
//!     .build();
//!
//! let page = client.get("https://example.com").await?;
//! if page.is_success() {
//!     println!("{}", page.text());
//! }
//!
//! let pages = client
//!     .request(http::Method::GET)
//!     .header("X-Trace: 1")
//!     .send_batch(["https://a.example", "https://b.example"])
//!     .await?;
//! ```

use crate::base::neterror::NetError;
use crate::config::{FetchConfig, DEFAULT_CONCURRENCY_LIMIT};
use crate::fetch::outcome::BatchOutcome;
use crate::fetch::scheduler::FetchScheduler;
use crate::fetch::transport::TransportKind;
use crate::http::mime::{ExtensionMimeResolver, MimeResolve};
use crate::http::requestspec::{
    default_user_agent, CookieSpec, PostData, RequestSpec, RequestSpecBuilder, Timeouts,
};
use crate::http::result::FetchResult;
use crate::socket::proxy::ProxySettings;
use http::Method;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// HTTP Client for fetching URLs.
///
/// Use [`Client::builder()`] to configure and create a client.
#[derive(Clone)]
pub struct Client {
    scheduler: FetchScheduler,
    kind: TransportKind,
    user_agent: String,
    timeouts: Timeouts,
    proxy: Option<ProxySettings>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a new client with default settings.
    pub fn new() -> Self {
        ClientBuilder::default().build()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.kind
    }

    pub fn concurrency_limit(&self) -> usize {
        self.scheduler.concurrency_limit()
    }

    /// Start building a request with custom method.
    pub fn request(&self, method: Method) -> RequestBuilder {
        let spec = RequestSpec::builder(method)
            .user_agent(self.user_agent.clone())
            .timeouts(self.timeouts)
            .proxy(self.proxy.clone());
        RequestBuilder {
            client: self.clone(),
            spec,
        }
    }

    /// GET one URL.
    pub async fn get(&self, url: &str) -> Result<FetchResult, NetError> {
        self.request(Method::GET).send(url).await
    }

    /// POST `data` to one URL.
    pub async fn post(&self, url: &str, data: impl Into<PostData>) -> Result<FetchResult, NetError> {
        self.request(Method::POST).body_for(url, data).send(url).await
    }

    /// PUT `data` to one URL.
    pub async fn put(&self, url: &str, data: impl Into<PostData>) -> Result<FetchResult, NetError> {
        self.request(Method::PUT).body_for(url, data).send(url).await
    }

    /// DELETE one URL.
    pub async fn delete(&self, url: &str) -> Result<FetchResult, NetError> {
        self.request(Method::DELETE).send(url).await
    }

    /// POST a file as multipart field `field`, alongside `data`.
    pub async fn upload(
        &self,
        url: &str,
        path: impl Into<PathBuf>,
        field: &str,
        data: impl Into<PostData>,
    ) -> Result<FetchResult, NetError> {
        self.request(Method::POST)
            .file(path, field)
            .body_for(url, data)
            .send(url)
            .await
    }

    /// GET every URL.
    pub async fn get_batch<I, S>(&self, urls: I) -> Result<HashMap<String, FetchResult>, NetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(Method::GET).send_batch(urls).await
    }

    /// POST each URL its own data.
    pub async fn post_batch<I, S, D>(&self, items: I) -> Result<HashMap<String, FetchResult>, NetError>
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<PostData>,
    {
        self.with_bodies(Method::POST, items).await
    }

    /// PUT each URL its own data.
    pub async fn put_batch<I, S, D>(&self, items: I) -> Result<HashMap<String, FetchResult>, NetError>
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<PostData>,
    {
        self.with_bodies(Method::PUT, items).await
    }

    /// DELETE every URL.
    pub async fn delete_batch<I, S>(&self, urls: I) -> Result<HashMap<String, FetchResult>, NetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(Method::DELETE).send_batch(urls).await
    }

    async fn with_bodies<I, S, D>(
        &self,
        method: Method,
        items: I,
    ) -> Result<HashMap<String, FetchResult>, NetError>
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<PostData>,
    {
        let mut builder = self.request(method);
        let mut urls = Vec::new();
        for (url, data) in items {
            let url = url.into();
            builder = builder.body_for(url.clone(), data);
            urls.push(url);
        }
        builder.send_batch(urls).await
    }

    /// Run a prepared spec against `urls`, keeping the raw outcomes.
    pub async fn fetch_batch<I, S>(&self, urls: I, spec: RequestSpec) -> Result<BatchOutcome, NetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scheduler.fetch(urls, Arc::new(spec)).await
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    user_agent: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    proxy: Option<ProxySettings>,
    concurrency_limit: Option<usize>,
    transport: Option<TransportKind>,
    mime_resolver: Option<Arc<dyn MimeResolve>>,
}

impl ClientBuilder {
    /// Apply every knob of `config`.
    pub fn from_config(mut self, config: &FetchConfig) -> Self {
        let timeouts = config.timeouts();
        self.user_agent = config.user_agent.clone();
        self.timeout = Some(timeouts.total.unwrap_or(Duration::ZERO));
        self.connect_timeout = Some(timeouts.connect);
        self.concurrency_limit = Some(config.concurrency_limit);
        self.transport = config.transport;
        self.proxy = config.proxy.as_ref().map(|p| p.to_settings());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set total per-URL timeout. `Duration::ZERO` disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Route every request through an HTTP proxy.
    pub fn proxy(mut self, host: impl Into<String>, port: u16) -> Self {
        self.proxy = Some(ProxySettings::new(host, port));
        self
    }

    /// Credentials for the proxy set with [`proxy`](Self::proxy).
    pub fn proxy_auth(mut self, user: &str, pass: &str) -> Self {
        self.proxy = self.proxy.map(|p| p.with_auth(user, pass));
        self
    }

    /// URLs in flight at once; `0` admits all of them immediately.
    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    /// Override the detected transport.
    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.transport = Some(kind);
        self
    }

    pub fn mime_resolver(mut self, resolver: Arc<dyn MimeResolve>) -> Self {
        self.mime_resolver = Some(resolver);
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        let kind = self.transport.unwrap_or_else(TransportKind::detect);
        let mime = self
            .mime_resolver
            .unwrap_or_else(|| Arc::new(ExtensionMimeResolver));
        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            connect: self.connect_timeout.unwrap_or(defaults.connect),
            total: match self.timeout {
                Some(t) if t.is_zero() => None,
                Some(t) => Some(t),
                None => defaults.total,
            },
        };

        Client {
            scheduler: FetchScheduler::new(
                kind.build(mime),
                self.concurrency_limit.unwrap_or(DEFAULT_CONCURRENCY_LIMIT),
            ),
            kind,
            user_agent: self.user_agent.unwrap_or_else(default_user_agent),
            timeouts,
            proxy: self.proxy,
        }
    }
}

/// Builder for one call, frozen into a [`RequestSpec`] on send.
pub struct RequestBuilder {
    client: Client,
    spec: RequestSpecBuilder,
}

impl RequestBuilder {
    /// Add a header; a later call with the same name replaces it.
    pub fn header(mut self, line: &str) -> Self {
        self.spec = self.spec.header_line(line);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.spec = self.spec.user_agent(ua);
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.spec = self.spec.referer(referer);
        self
    }

    pub fn cookie(mut self, cookie: impl Into<CookieSpec>) -> Self {
        self.spec = self.spec.cookie(cookie);
        self
    }

    /// Connect to `ip` instead of resolving the URL host. `Host` keeps the URL host.
    pub fn ip_override(mut self, ip: impl Into<String>) -> Self {
        self.spec = self.spec.ip_override(ip);
        self
    }

    pub fn basic_auth(mut self, user: &str, pass: &str) -> Self {
        self.spec = self.spec.basic_auth(user, pass);
        self
    }

    /// Attach a file as multipart field `field` (POST only).
    pub fn file(mut self, path: impl Into<PathBuf>, field: &str) -> Self {
        self.spec = self.spec.file(path, field);
        self
    }

    /// Body for `url` within this call.
    pub fn body_for(mut self, url: impl Into<String>, data: impl Into<PostData>) -> Self {
        self.spec = self.spec.body_for(url, data);
        self
    }

    /// Total timeout for this call. `Duration::ZERO` disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let connect = self.client.timeouts.connect;
        self.spec = self.spec.timeouts(Timeouts {
            connect,
            total: (!timeout.is_zero()).then_some(timeout),
        });
        self
    }

    /// Fetch one URL.
    pub async fn send(self, url: &str) -> Result<FetchResult, NetError> {
        let mut results = self.send_batch([url]).await?;
        results.remove(url).ok_or(NetError::IncompleteBatch {
            expected: 1,
            completed: 0,
        })
    }

    /// Fetch every URL; the map is keyed by the URLs as given.
    pub async fn send_batch<I, S>(self, urls: I) -> Result<HashMap<String, FetchResult>, NetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = self.spec.build()?;
        let outcome = self.client.fetch_batch(urls, spec).await?;
        Ok(outcome.into_results())
    }
}
