//! Batch fetch engine.
//!
//! - [`scheduler`]: deduplication, the bounded in-flight window, completion counting
//! - [`transport`]: the seam both strategies implement
//! - [`multiplexed`]: concurrent hyper transfers
//! - [`sequential`]: one raw socket at a time

pub mod multiplexed;
pub mod outcome;
pub mod scheduler;
pub mod sequential;
pub mod task;
pub mod transport;

pub use outcome::{BatchOutcome, TaskOutcome};
pub use scheduler::{FetchScheduler, TaskQueue};
pub use transport::{Transport, TransportKind};
