use crate::base::neterror::NetError;
use crate::fetch::scheduler::TaskQueue;
use crate::http::requestspec::RequestSpec;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Alias for the `Future` type returned by a transport run.
pub type Running<'a> = Pin<Box<dyn Future<Output = Result<(), NetError>> + Send + 'a>>;

/// Drives every URL of a [`TaskQueue`] to a terminal outcome.
///
/// Implementations pull URLs with `admit`, report each one exactly once
/// with `complete`, and only return `Err` for a failure of the whole
/// batch. Per-URL failures are outcomes, not errors.
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    fn run<'a>(&'a self, queue: &'a mut TaskQueue, spec: Arc<RequestSpec>) -> Running<'a>;
}

/// Blanket implementation for Arc-wrapped transports.
impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn kind(&self) -> TransportKind {
        (**self).kind()
    }

    fn run<'a>(&'a self, queue: &'a mut TaskQueue, spec: Arc<RequestSpec>) -> Running<'a> {
        (**self).run(queue, spec)
    }
}

/// Available transport strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// hyper connections driven concurrently on the runtime.
    #[default]
    Multiplexed,
    /// One raw socket at a time, read to EOF.
    Sequential,
}

impl TransportKind {
    /// Pick the best transport this build supports.
    ///
    /// [`Multiplexed`](Self::Multiplexed) unless the crate is built with the
    /// `socket-only` feature.
    pub fn detect() -> Self {
        if cfg!(feature = "socket-only") {
            TransportKind::Sequential
        } else {
            TransportKind::Multiplexed
        }
    }

    /// Instantiate the transport.
    pub fn build(self, mime: Arc<dyn crate::http::mime::MimeResolve>) -> Arc<dyn Transport> {
        match self {
            TransportKind::Multiplexed => {
                Arc::new(crate::fetch::multiplexed::MultiplexedTransport::new(mime))
            }
            TransportKind::Sequential => {
                Arc::new(crate::fetch::sequential::SequentialTransport::new(mime))
            }
        }
    }
}
