//! Request construction and response decoding.
//!
//! - [`requestspec`]: immutable per-call request description
//! - [`rawrequest`]: HTTP/1.1 framing for the raw socket transport
//! - [`decoder`] / [`chunked`]: status line, header lines and body reassembly
//! - [`redirect`]: `Location` following with a bounded chain
//! - [`result`]: the caller-facing view of one URL's outcome

pub mod chunked;
pub mod decoder;
pub mod mime;
pub mod multipart;
pub mod orderedheaders;
pub mod rawrequest;
pub mod redirect;
pub mod requestbody;
pub mod requestspec;
pub mod responsebody;
pub mod result;
pub mod streamfactory;

// Re-exports for convenience
pub use decoder::{DecodedResponse, ResponseDecoder};
pub use requestbody::RequestBody;
pub use requestspec::{CookieSpec, PostData, RequestSpec};
pub use responsebody::ResponseBody;
pub use result::FetchResult;
