//! Fetch every URL given on the command line as one batch.
//!
//! Run with: cargo run --example batch_fetch -- https://example.com https://example.org
//!
//! Set RUST_LOG=fetchnet=debug to watch admission and redirects. Set
//! FETCHNET_TRANSPORT=sequential to use the raw socket transport.

use fetchnet::{Client, TransportKind};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        eprintln!("usage: batch_fetch <url>...");
        return Ok(());
    }

    let mut builder = Client::builder().concurrency_limit(4);
    if std::env::var("FETCHNET_TRANSPORT").as_deref() == Ok("sequential") {
        builder = builder.transport(TransportKind::Sequential);
    }
    let client = builder.build();

    println!("Fetching {} URLs with {:?}...", urls.len(), client.transport_kind());
    let results = client.get_batch(urls.iter().cloned()).await?;

    for url in &urls {
        let Some(result) = results.get(url) else {
            continue;
        };
        match result.error() {
            Some(e) => println!("{:<40} failed: {} ({:.3}s)", url, e, result.time()),
            None => println!(
                "{:<40} {} {:>8} bytes {:.3}s {}",
                url,
                result.http_code(),
                result.body().len(),
                result.time(),
                result.header("Content-Type").unwrap_or("-"),
            ),
        }
    }

    Ok(())
}
