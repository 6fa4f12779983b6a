//! # fetchnet
//!
//! Batch HTTP fetching for Rust.
//!
//! `fetchnet` takes one URL or a list of URLs, runs GET, POST, PUT or DELETE
//! against all of them with a bounded number in flight, and hands back one
//! [`FetchResult`] per URL: status code, body, headers, cookies and timing.
//!
//! ## Features
//!
//! - **Bounded concurrency**: at most `concurrency_limit` URLs in flight, backlog admitted as slots free up
//! - **Two transports**: concurrent hyper connections, or a raw socket fallback executed one URL at a time
//! - **Per-URL bodies**: every URL in a batch can carry its own form data
//! - **Multipart uploads**: file fields with MIME types resolved from the extension
//! - **Redirects**: followed up to 10 hops, carrying cookies on the socket transport
//! - **Proxy Support**: forward proxying for `http`, `CONNECT` tunnels for `https`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fetchnet::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::builder().concurrency_limit(8).build();
//!     let results = client
//!         .get_batch(["https://example.com", "https://example.org"])
//!         .await
//!         .unwrap();
//!     for (url, result) in &results {
//!         println!("{url}: {} in {:.3}s", result.http_code(), result.time());
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`client`] - High-level request API
//! - [`config`] - Serializable client settings
//! - [`fetch`] - Scheduler and transports
//! - [`http`] - Request framing, response decoding, redirects, results
//! - [`socket`] - Connection setup, proxy and TLS

pub mod base;
pub mod client;
pub mod config;
pub mod fetch;
pub mod http;
pub mod socket;

pub use base::neterror::NetError;
pub use client::{Client, ClientBuilder, RequestBuilder};
pub use config::FetchConfig;
pub use fetch::TransportKind;
pub use http::FetchResult;
