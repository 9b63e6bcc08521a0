//! MangaBaka API access.
//!
//! Wire types, the HTTP transport seam, the token-bucket rate limiter and
//! the retrying client composed from them.

pub mod client;
pub mod rate_limiter;
pub mod transport;
pub mod types;

pub use client::MangaBakaClient;
pub use rate_limiter::{RateLimitCallback, RateLimiter};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
