use url::Url;
use zeroize::Zeroizing;

/// How a request travels through an HTTP proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMode {
    /// Plain HTTP: connect to the proxy and send the absolute URL as request target.
    Forward,
    /// HTTPS: open a `CONNECT` tunnel first, then TLS to the origin through it.
    Tunnel,
}

/// HTTP proxy address with optional credentials.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
    /// Proxy username for authentication
    pub username: Option<String>,
    /// Proxy password (zeroized on drop)
    pub password: Option<Zeroizing<String>>,
}

impl ProxySettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
        }
    }

    /// Add authentication credentials.
    pub fn with_auth(mut self, user: &str, pass: &str) -> Self {
        self.username = Some(user.to_string());
        self.password = Some(Zeroizing::new(pass.to_string()));
        self
    }

    /// Tunnel for `https` targets, forward everything else.
    pub fn mode_for(&self, target: &Url) -> ProxyMode {
        if target.scheme() == "https" {
            ProxyMode::Tunnel
        } else {
            ProxyMode::Forward
        }
    }

    /// Get `Proxy-Authorization` header value.
    pub fn get_auth_header(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some(basic_credentials(u, p.as_str())),
            _ => None,
        }
    }

    /// Check if this proxy requires authentication.
    pub fn requires_auth(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Get proxy host and port.
    pub fn host_port(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

/// `Basic` credentials as used by both `Authorization` and `Proxy-Authorization`.
pub fn basic_credentials(user: &str, pass: &str) -> String {
    use base64::{engine::general_purpose, Engine as _};
    let creds = Zeroizing::new(format!("{}:{}", user, pass));
    format!("Basic {}", general_purpose::STANDARD.encode(creds.as_bytes()))
}
