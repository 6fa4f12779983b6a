use crate::base::neterror::NetError;
use boring::ssl::{SslConnector, SslMethod, SslVerifyMode, SslVersion};
use tokio::net::TcpStream;
use tokio_boring::SslStream;

/// TLS client settings for fetch targets.
///
/// Certificates are not verified: targets are fetched the way a
/// scraping client with verification switched off would fetch them.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub alpn_protos: Vec<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1),
            max_version: Some(SslVersion::TLS1_3),
            // Both transports speak HTTP/1.1 only
            alpn_protos: vec!["http/1.1".to_string()],
        }
    }
}

impl TlsConfig {
    fn connector(&self) -> Result<SslConnector, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;

        if let Some(min) = self.min_version {
            builder.set_min_proto_version(Some(min)).map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_version {
            builder.set_max_proto_version(Some(max)).map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.alpn_protos.is_empty() {
            let mut alpn_wire = Vec::new();
            for proto in &self.alpn_protos {
                if proto.len() > 255 {
                    return Err(NetError::SslProtocolError);
                }
                alpn_wire.push(proto.len() as u8);
                alpn_wire.extend_from_slice(proto.as_bytes());
            }
            builder.set_alpn_protos(&alpn_wire).map_err(|_| NetError::SslProtocolError)?;
        }

        builder.set_verify(SslVerifyMode::NONE);
        Ok(builder.build())
    }

    /// Run the client handshake for `host` over an established stream.
    pub async fn handshake(
        &self,
        host: &str,
        stream: TcpStream,
    ) -> Result<SslStream<TcpStream>, NetError> {
        let connector = self.connector()?;
        let mut config = connector.configure().map_err(|_| NetError::SslProtocolError)?;
        config.set_verify_hostname(false);
        config.set_use_server_name_indication(Self::should_set_sni(host));

        tokio_boring::connect(config, host, stream).await.map_err(|e| {
            tracing::debug!(host = %host, error = ?e, "TLS handshake failed");
            NetError::SslProtocolError
        })
    }

    /// Check if SNI (Server Name Indication) should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .is_err()
    }
}
