//! MangaBaka API client with rate limiting and retry logic.
//!
//! One logical request gets up to four attempts. Timeouts and server-side
//! 5xx responses retry; HTTP 429 sleeps a fixed cool-down and retries up
//! to a separate budget; every other failure is terminal for the call.

use crate::api::rate_limiter::{RateLimitCallback, RateLimiter};
use crate::api::transport::{RawResponse, ReqwestTransport, Transport, TransportError};
use crate::api::types::MbResponse;
use crate::error::{data_code, network_code, TalkerError};
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Total attempts per logical request
const MAX_ATTEMPTS: u32 = 4;
/// Fixed cool-down after an HTTP 429
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(10);
/// Rate-limit hits tolerated within one logical request
const MAX_RATE_LIMIT_HITS: u32 = 3;

/// Rate-limited MangaBaka HTTP client
pub struct MangaBakaClient {
    transport: Arc<dyn Transport>,
    rate_limiter: RateLimiter,
    /// Requests actually sent, across retries (diagnostics)
    total_requests: AtomicU64,
}

impl MangaBakaClient {
    /// Create a client backed by a real HTTP transport
    pub fn new(user_agent: &str, requests_per_minute: u32) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(user_agent)?);
        Ok(Self::with_transport(transport, requests_per_minute))
    }

    /// Create a client over any transport (tests inject scripted ones)
    pub fn with_transport(transport: Arc<dyn Transport>, requests_per_minute: u32) -> Self {
        Self {
            transport,
            rate_limiter: RateLimiter::new(requests_per_minute),
            total_requests: AtomicU64::new(0),
        }
    }

    /// Number of HTTP requests this client has sent
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// GET an endpoint and check the provider envelope
    ///
    /// A body whose `status` field is not 200 is a provider-side failure
    /// even when the HTTP exchange succeeded.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
        cancel: &CancellationToken,
        on_rate_limit: Option<&RateLimitCallback>,
    ) -> Result<MbResponse<T>, TalkerError> {
        let response: MbResponse<T> = self.get_raw(url, params, cancel, on_rate_limit).await?;

        if response.status != 200 {
            let message = response.message.unwrap_or_default();
            debug!(url, status = response.status, message, "Provider envelope reported failure");
            return Err(TalkerError::network(
                network_code::GENERIC,
                format!("{}: {}", response.status, message),
            ));
        }

        Ok(response)
    }

    async fn get_raw<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
        cancel: &CancellationToken,
        on_rate_limit: Option<&RateLimitCallback>,
    ) -> Result<MbResponse<T>, TalkerError> {
        let mut limit_counter = 0u32;

        for attempt in 1..=MAX_ATTEMPTS {
            if cancel.is_cancelled() {
                return Err(TalkerError::network(network_code::GENERIC, "request cancelled"));
            }

            self.rate_limiter.acquire(on_rate_limit).await;
            self.total_requests.fetch_add(1, Ordering::Relaxed);
            debug!(url, attempt, "Requesting");

            match self.transport.get(url, params).await {
                Ok(RawResponse { status: 200, body }) => {
                    return serde_json::from_str(&body).map_err(|e| {
                        warn!(url, error = %e, "Response body is not valid JSON");
                        TalkerError::data(
                            data_code::MALFORMED_JSON,
                            format!("MangaBaka did not provide valid JSON: {}", e),
                        )
                    });
                }
                Ok(RawResponse {
                    status: status @ (500 | 502 | 503),
                    ..
                }) => {
                    debug!(url, attempt, status, "Server error, retrying");
                }
                Ok(RawResponse { status: 429, .. }) => {
                    limit_counter += 1;
                    if limit_counter > MAX_RATE_LIMIT_HITS {
                        error!(url, hits = limit_counter, "Rate limit error, exceeded 3 retries");
                        return Err(TalkerError::network(
                            network_code::RATE_LIMIT,
                            "rate limit exceeded",
                        ));
                    }
                    info!(
                        url,
                        cooldown_secs = RATE_LIMIT_COOLDOWN.as_secs(),
                        total_requests = self.total_requests(),
                        "Rate limit encountered, waiting"
                    );
                    sleep(RATE_LIMIT_COOLDOWN).await;
                }
                Ok(RawResponse { status, body }) => {
                    error!(url, status, body, "Unexpected HTTP status");
                    return Err(TalkerError::network(
                        network_code::STATUS,
                        format!("unexpected HTTP status {}", status),
                    ));
                }
                Err(TransportError::Timeout) => {
                    debug!(url, attempt, "Connection timed out");
                    if attempt >= MAX_ATTEMPTS {
                        return Err(TalkerError::network(
                            network_code::TIMEOUT,
                            "connection timed out",
                        ));
                    }
                }
                Err(TransportError::Other(message)) => {
                    warn!(url, error = %message, "Transport error");
                    return Err(TalkerError::network(network_code::GENERIC, message));
                }
            }
        }

        Err(TalkerError::network(
            network_code::EXHAUSTED,
            format!("request failed after {} attempts", MAX_ATTEMPTS),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::testing::{ok, status, MockTransport};
    use crate::api::types::MbSeries;

    const SERIES_BODY: &str = r#"{"status": 200, "data": {"id": 10023, "title": "Naruto"}}"#;

    fn client(responses: Vec<Result<RawResponse, TransportError>>) -> MangaBakaClient {
        MangaBakaClient::with_transport(MockTransport::new(responses), 60)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_parses_envelope() {
        let client = client(vec![ok(SERIES_BODY)]);

        let response: MbResponse<MbSeries> = client
            .get_json("https://api/series/10023", &[], &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(response.data.unwrap().title, "Naruto");
        assert_eq!(client.total_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_envelope_failure_is_network_error() {
        let client = client(vec![ok(
            r#"{"status": 404, "message": "Series not found"}"#,
        )]);

        let err = client
            .get_json::<MbSeries>("https://api/series/0", &[], &CancellationToken::new(), None)
            .await
            .unwrap_err();

        match err {
            TalkerError::Network { code, message } => {
                assert_eq!(code, network_code::GENERIC);
                assert!(message.contains("404"));
                assert!(message.contains("Series not found"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_four_rate_limits_fail_terminally() {
        let client = client(vec![status(429), status(429), status(429), status(429)]);

        let err = client
            .get_json::<MbSeries>("https://api/series/1", &[], &CancellationToken::new(), None)
            .await
            .unwrap_err();

        assert!(err.is_rate_limit());
        assert_eq!(client.total_requests(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_rate_limits_then_success() {
        let client = client(vec![status(429), status(429), ok(SERIES_BODY)]);

        let response: MbResponse<MbSeries> = client
            .get_json("https://api/series/10023", &[], &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(response.data.unwrap().id, 10023);
        assert_eq!(client.total_requests(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_retry_until_success() {
        let client = client(vec![status(500), status(502), status(503), ok(SERIES_BODY)]);

        let response: MbResponse<MbSeries> = client
            .get_json("https://api/series/10023", &[], &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(client.total_requests(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_server_errors_exhaust_retries() {
        let client = client(vec![status(500), status(500), status(500), status(500)]);

        let err = client
            .get_json::<MbSeries>("https://api/series/1", &[], &CancellationToken::new(), None)
            .await
            .unwrap_err();

        match err {
            TalkerError::Network { code, .. } => assert_eq!(code, network_code::EXHAUSTED),
            other => panic!("expected network error, got {:?}", other),
        }
        assert_eq!(client.total_requests(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_retry_silently_then_fail() {
        let client = client(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
        ]);

        let err = client
            .get_json::<MbSeries>("https://api/series/1", &[], &CancellationToken::new(), None)
            .await
            .unwrap_err();

        match err {
            TalkerError::Network { code, .. } => assert_eq!(code, network_code::TIMEOUT),
            other => panic!("expected timeout error, got {:?}", other),
        }
        assert_eq!(client.total_requests(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_success() {
        let client = client(vec![Err(TransportError::Timeout), ok(SERIES_BODY)]);

        let response: MbResponse<MbSeries> = client
            .get_json("https://api/series/10023", &[], &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_status_does_not_retry() {
        let client = client(vec![status(404)]);

        let err = client
            .get_json::<MbSeries>("https://api/series/1", &[], &CancellationToken::new(), None)
            .await
            .unwrap_err();

        match err {
            TalkerError::Network { code, message } => {
                assert_eq!(code, network_code::STATUS);
                assert!(message.contains("404"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
        assert_eq!(client.total_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_json_is_data_error() {
        let client = client(vec![ok("not json at all")]);

        let err = client
            .get_json::<MbSeries>("https://api/series/1", &[], &CancellationToken::new(), None)
            .await
            .unwrap_err();

        match err {
            TalkerError::Data { code, .. } => assert_eq!(code, data_code::MALFORMED_JSON),
            other => panic!("expected data error, got {:?}", other),
        }
        assert_eq!(client.total_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_transport_error_does_not_retry() {
        let client = client(vec![Err(TransportError::Other("dns failure".to_string()))]);

        let err = client
            .get_json::<MbSeries>("https://api/series/1", &[], &CancellationToken::new(), None)
            .await
            .unwrap_err();

        match err {
            TalkerError::Network { code, message } => {
                assert_eq!(code, network_code::GENERIC);
                assert_eq!(message, "dns failure");
            }
            other => panic!("expected network error, got {:?}", other),
        }
        assert_eq!(client.total_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_stops_before_sending() {
        let client = client(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .get_json::<MbSeries>("https://api/series/1", &[], &cancel, None)
            .await
            .unwrap_err();

        assert!(matches!(err, TalkerError::Network { .. }));
        assert_eq!(client.total_requests(), 0);
    }
}
