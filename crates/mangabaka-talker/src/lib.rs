//! MangaBaka metadata talker.
//!
//! This library searches and fetches comic series metadata from the
//! MangaBaka API, with rate limiting, result caching and configurable
//! content filters.

pub mod api;
pub mod error;
pub mod filters;
pub mod talker;

pub use api::{MangaBakaClient, RateLimitCallback, RateLimiter};
pub use error::TalkerError;
pub use filters::FilterPipeline;
pub use talker::{MangaBakaSettings, MangaBakaTalker, SearchOptions};
