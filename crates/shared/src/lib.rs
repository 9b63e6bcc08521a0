//! Shared library for the comic metadata tagger.
//!
//! This crate provides the host-side collaborators any metadata talker
//! builds on:
//! - Configuration management
//! - The generic comic metadata model
//! - The series cache contract and its SQLite implementation
//! - Title matching utilities
//! - Logging infrastructure

pub mod cache;
pub mod config;
pub mod logging;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use cache::{CachedSeries, SeriesCache, SqliteCache};
pub use config::Config;
pub use logging::LogConfig;
pub use models::{ComicSeries, Credit, GenericMetadata, MetadataOrigin};

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
