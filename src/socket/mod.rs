//! Socket and connection management.
//!
//! One fresh connection per request, mirroring Chromium's `net/socket/`:
//! - [`connectjob`]: DNS → TCP → (CONNECT) → TLS connection flow
//! - [`proxy`]: HTTP proxy settings and credentials
//! - [`tls`]: BoringSSL client without certificate verification

pub mod client;
pub mod connectjob;
pub mod proxy;
pub mod tls;
