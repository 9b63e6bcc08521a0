//! HTTP transport seam.
//!
//! The client talks to the network through this trait so request-sequence
//! behavior (retries, cool-downs, pagination) can be tested against
//! scripted responses without a socket.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Raw HTTP exchange result, before any JSON handling
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Transport-level failures, before retry classification
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Other(String),
}

/// Issues one GET request; no retries, no rate limiting
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, params: &[(String, String)])
        -> Result<RawResponse, TransportError>;
}

/// Production transport backed by reqwest
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

/// Scripted transport shared by client and talker tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Pops one scripted response per request; panics when the script runs dry
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
        requests: Mutex<Vec<String>>,
    }

    impl MockTransport {
        pub fn new(responses: Vec<Result<RawResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        /// URLs requested so far
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        /// Responses not yet consumed
        pub fn remaining(&self) -> usize {
            self.responses.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(
            &self,
            url: &str,
            _params: &[(String, String)],
        ) -> Result<RawResponse, TransportError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected request to {}", url))
        }
    }

    pub fn ok(body: &str) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    pub fn status(status: u16) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status,
            body: String::new(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Other(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}
