use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::decoder::parse_status_line;
use crate::http::rawrequest::RequestTarget;
use crate::http::requestspec::RequestSpec;
use crate::socket::client::SocketType;
use crate::socket::proxy::ProxyMode;
use crate::socket::tls::TlsConfig;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use url::Url;

/// Upper bound on a proxy's `CONNECT` response head.
const MAX_TUNNEL_RESPONSE: usize = 8192;

/// Socket ready for one request, plus how that request must address its target.
#[derive(Debug)]
pub struct Connection {
    pub socket: SocketType,
    pub target: RequestTarget,
}

/// Manages the connection process: DNS -> TCP -> (CONNECT) -> SSL.
/// Roughly equivalent to net::ConnectJob.
pub struct ConnectJob;

impl ConnectJob {
    /// Connect for `url` as described by `spec`.
    ///
    /// Without a proxy the socket goes to the IP override, or the URL host.
    /// With a proxy the socket goes to the proxy: plain HTTP is forwarded
    /// with an absolute request target, HTTPS is tunnelled with `CONNECT`.
    /// TLS always uses the URL host for SNI.
    pub async fn connect(url: &Url, spec: &RequestSpec) -> Result<Connection, NetError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(NetError::UnknownUrlScheme);
        }
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;
        let dial_host = spec.ip_override.as_deref().unwrap_or(host);
        let connect_timeout = spec.timeouts.connect;

        let (stream, target) = match &spec.proxy {
            Some(proxy) => {
                let (phost, pport) = proxy.host_port();
                let mut stream = dial(phost, pport, connect_timeout)
                    .await
                    .map_err(|e| {
                        tracing::debug!(proxy = %phost, port = pport, error = %e, "proxy connect failed");
                        NetError::ProxyConnectionFailed
                    })?;
                match proxy.mode_for(url) {
                    ProxyMode::Forward => (stream, RequestTarget::Absolute),
                    ProxyMode::Tunnel => {
                        open_tunnel(
                            &mut stream,
                            dial_host,
                            port,
                            proxy.get_auth_header().as_deref(),
                        )
                        .await?;
                        (stream, RequestTarget::Origin)
                    }
                }
            }
            None => (
                dial(dial_host, port, connect_timeout).await?,
                RequestTarget::Origin,
            ),
        };

        let socket = if scheme == "https" {
            SocketType::Ssl(TlsConfig::default().handshake(host, stream).await?)
        } else {
            SocketType::Tcp(stream)
        };

        Ok(Connection { socket, target })
    }
}

/// Resolve and connect, trying each address in turn within `timeout`.
pub async fn dial(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, NetError> {
    tokio::time::timeout(timeout, dial_addrs(host, port))
        .await
        .map_err(|_| NetError::ConnectionTimedOut)?
}

async fn dial_addrs(host: &str, port: u16) -> Result<TcpStream, NetError> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let addrs: Vec<_> = tokio::net::lookup_host((host, port))
        .await
        .dns_context(host)?
        .collect();
    if addrs.is_empty() {
        return Err(NetError::NameNotResolved);
    }

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(s) => {
                let _ = s.set_nodelay(true);
                return Ok(s);
            }
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) => Err::<TcpStream, _>(e).connection_context(host, port),
        None => Err(NetError::ConnectionFailed),
    }
}

async fn open_tunnel(
    stream: &mut TcpStream,
    host: &str,
    port: u16,
    auth: Option<&str>,
) -> Result<(), NetError> {
    let target = format!("{}:{}", host, port);
    let mut connect_req = format!("CONNECT {} HTTP/1.1\r\nHost: {}\r\n", target, target);
    if let Some(auth) = auth {
        connect_req.push_str(&format!("Proxy-Authorization: {}\r\n", auth));
    }
    connect_req.push_str("\r\n");

    stream
        .write_all(connect_req.as_bytes())
        .await
        .map_err(|_| NetError::TunnelConnectionFailed)?;

    // Read only the response head; the tunnel starts right after it
    let mut head = Vec::with_capacity(256);
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_TUNNEL_RESPONSE {
            return Err(NetError::TunnelConnectionFailed);
        }
        let n = stream
            .read(&mut byte)
            .await
            .map_err(|_| NetError::TunnelConnectionFailed)?;
        if n == 0 {
            return Err(NetError::TunnelConnectionFailed);
        }
        head.push(byte[0]);
    }

    let head = String::from_utf8_lossy(&head);
    let status = head.lines().next().and_then(parse_status_line);
    if status != Some(200) {
        tracing::warn!(tunnel = %target, status = ?status, "proxy refused tunnel");
        return Err(NetError::TunnelConnectionFailed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_dial_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = dial("127.0.0.1", port, Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, NetError::ConnectionFailedTo { port: p, .. } if p == port));
    }

    #[tokio::test]
    async fn test_unknown_scheme() {
        let spec = RequestSpec::builder(http::Method::GET).build().unwrap();
        let url = Url::parse("ftp://example.com/file").unwrap();
        let err = ConnectJob::connect(&url, &spec).await.unwrap_err();
        assert_eq!(err, NetError::UnknownUrlScheme);
    }

    #[tokio::test]
    async fn test_tunnel_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 407 Proxy Authentication Required\r\n\r\n")
                    .await;
            }
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let err = open_tunnel(&mut stream, "example.com", 443, None)
            .await
            .unwrap_err();
        assert_eq!(err, NetError::TunnelConnectionFailed);
    }
}
