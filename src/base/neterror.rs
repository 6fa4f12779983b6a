use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Connection to {host}:{port} failed: {reason}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        reason: String,
    },
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Could not resolve {domain}: {reason}")]
    NameNotResolvedFor { domain: String, reason: String },
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Tunnel connection failed")]
    TunnelConnectionFailed,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Proxy connection failed")]
    ProxyConnectionFailed,

    // Local Errors
    #[error("Operation timed out")]
    TimedOut,
    #[error("Cannot read upload file {path}: {reason}")]
    FileReadFailed { path: String, reason: String },

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Unknown URL scheme")]
    UnknownUrlScheme,
    #[error("Too many redirects")]
    TooManyRedirects,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Invalid chunked encoding")]
    InvalidChunkedEncoding,
    #[error("Empty response")]
    EmptyResponse,
    #[error("Content decoding failed")]
    ContentDecodingFailed,
    #[error("Invalid header")]
    InvalidHeader,

    // Batch Errors
    #[error("Multiplexed transfer loop aborted")]
    MultiplexAborted,
    #[error("Batch incomplete: {completed} of {expected} URLs have an outcome")]
    IncompleteBatch { expected: usize, completed: usize },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::TimedOut => -7,
            NetError::FileReadFailed { .. } => -6,

            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionFailed => -104,
            NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolved => -105,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::TunnelConnectionFailed => -111,
            NetError::ConnectionTimedOut => -118,
            NetError::ProxyConnectionFailed => -130,

            NetError::InvalidUrl => -300,
            NetError::UnknownUrlScheme => -302,
            NetError::TooManyRedirects => -310,
            NetError::InvalidResponse => -320,
            NetError::InvalidChunkedEncoding => -321,
            NetError::EmptyResponse => -324,
            NetError::ContentDecodingFailed => -330,
            // Crate-specific codes live below -1000, clear of Chromium's list
            NetError::InvalidHeader => -1000,
            NetError::MultiplexAborted => -1001,
            NetError::IncompleteBatch { .. } => -1002,
            NetError::Unknown(code) => *code,
        }
    }

    /// Whether this error can only be produced for a whole batch, never for a single URL.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            NetError::MultiplexAborted | NetError::IncompleteBatch { .. }
        )
    }

    pub(crate) fn connection_failed_to(host: &str, port: u16, err: std::io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.to_string(),
            port,
            reason: err.to_string(),
        }
    }

    pub(crate) fn dns_failed(domain: &str, err: std::io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -7 => NetError::TimedOut,
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -111 => NetError::TunnelConnectionFailed,
            -118 => NetError::ConnectionTimedOut,
            -130 => NetError::ProxyConnectionFailed,

            -300 => NetError::InvalidUrl,
            -302 => NetError::UnknownUrlScheme,
            -310 => NetError::TooManyRedirects,
            -320 => NetError::InvalidResponse,
            -321 => NetError::InvalidChunkedEncoding,
            -324 => NetError::EmptyResponse,
            -330 => NetError::ContentDecodingFailed,
            -1000 => NetError::InvalidHeader,
            -1001 => NetError::MultiplexAborted,
            _ => NetError::Unknown(code),
        }
    }
}

impl From<std::io::Error> for NetError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
            ErrorKind::ConnectionReset => NetError::ConnectionReset,
            ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => NetError::ConnectionClosed,
            ErrorKind::TimedOut => NetError::ConnectionTimedOut,
            ErrorKind::UnexpectedEof => NetError::EmptyResponse,
            _ => NetError::ConnectionFailed,
        }
    }
}
