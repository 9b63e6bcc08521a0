//! Typed errors surfaced to the host application.
//!
//! The host catches these and presents them; nothing below retries once a
//! `TalkerError` has been produced. Sub-codes keep the original error
//! numbering so host-side handling stays stable across talkers.

use thiserror::Error;

/// Generic transport or provider failure
pub mod network_code {
    /// Unclassified transport failure or bad provider envelope
    pub const GENERIC: u8 = 0;
    /// Unexpected HTTP status outside the retryable set
    pub const STATUS: u8 = 1;
    /// Provider rate limit hit more times than the retry budget allows
    pub const RATE_LIMIT: u8 = 3;
    /// Connection timed out on every attempt
    pub const TIMEOUT: u8 = 4;
    /// Retry budget exhausted without a terminal classification
    pub const EXHAUSTED: u8 = 5;
}

/// Response-content failure
pub mod data_code {
    /// Body parsed but did not carry the expected fields
    pub const SCHEMA: u8 = 1;
    /// Body was not valid JSON
    pub const MALFORMED_JSON: u8 = 2;
    /// Cached bytes could not be read or deserialized
    pub const CACHE: u8 = 3;
}

/// Errors a talker raises to the host
#[derive(Debug, Error)]
pub enum TalkerError {
    /// Transport failure, exhausted retries, rate limit, unexpected status
    #[error("network error ({code}): {message}")]
    Network { code: u8, message: String },

    /// Response body not valid JSON, or schema not as expected
    #[error("data error ({code}): {message}")]
    Data { code: u8, message: String },
}

impl TalkerError {
    pub fn network(code: u8, message: impl Into<String>) -> Self {
        Self::Network {
            code,
            message: message.into(),
        }
    }

    pub fn data(code: u8, message: impl Into<String>) -> Self {
        Self::Data {
            code,
            message: message.into(),
        }
    }

    /// True when the failure was the provider's rate limit
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            Self::Network {
                code: network_code::RATE_LIMIT,
                ..
            }
        )
    }
}
