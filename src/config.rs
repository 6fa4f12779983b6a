//! Serializable client configuration.
//!
//! ```rust,ignore
//! let config = FetchConfig::from_json(r#"{"concurrency_limit": 5, "transport": "sequential"}"#)?;
//! let client = Client::builder().from_config(&config).build();
//! ```

use crate::fetch::transport::TransportKind;
use crate::http::requestspec::Timeouts;
use crate::socket::proxy::ProxySettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// URLs in flight at once when nothing else is configured.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 20;

/// Persistent client knobs. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// `None` sends `fetchnet/<version>`.
    pub user_agent: Option<String>,
    /// Total per-URL timeout in seconds; `0` disables it.
    pub timeout_secs: u64,
    pub connect_timeout_ms: u64,
    /// `0` admits every URL at once.
    pub concurrency_limit: usize,
    /// `None` uses [`TransportKind::detect`].
    pub transport: Option<TransportKind>,
    pub proxy: Option<ProxyConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: 30,
            connect_timeout_ms: 3000,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            transport: None,
            proxy: None,
        }
    }
}

impl FetchConfig {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            total: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        }
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.unwrap_or_else(TransportKind::detect)
    }
}

/// Proxy address with optional credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn to_settings(&self) -> ProxySettings {
        let settings = ProxySettings::new(self.host.clone(), self.port);
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => settings.with_auth(u, p),
            _ => settings,
        }
    }
}
