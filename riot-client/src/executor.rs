//! Sends upstream requests, applies the retry policy and classifies outcomes.

use crate::config::{RetryPolicy, Timeouts};
use crate::errors::{ApiError, ClientError, Endpoint, Result};
use crate::metrics_defs::{UPSTREAM_REQUESTS, UPSTREAM_REQUEST_DURATION, UPSTREAM_RETRIES};
use http::header::{ACCEPT, AUTHORIZATION, HeaderValue, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use shared::{counter, histogram};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use url::Url;

const API_KEY_HEADER: &str = "X-Riot-Token";

/// Credentials attached to an outbound request.
#[derive(Clone)]
pub enum Auth {
    /// The static application key from the configuration
    ApiKey,
    /// A user scoped OAuth token
    Bearer(String),
}

pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub url: Url,
    pub auth: Auth,
}

impl ApiRequest {
    pub fn new(endpoint: Endpoint, url: Url) -> Self {
        ApiRequest {
            endpoint,
            url,
            auth: Auth::ApiKey,
        }
    }

    pub fn with_bearer(endpoint: Endpoint, url: Url, token: &str) -> Self {
        ApiRequest {
            endpoint,
            url,
            auth: Auth::Bearer(token.to_string()),
        }
    }
}

/// A fully read upstream response.
struct RawResponse {
    status: StatusCode,
    retry_after: Option<Duration>,
    body: String,
}

#[derive(Clone)]
pub struct RequestExecutor {
    client: reqwest::Client,
    api_key: HeaderValue,
    retry: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(
        api_key: &str,
        user_agent: &str,
        retry: RetryPolicy,
        timeouts: &Timeouts,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .user_agent(user_agent)
            .build()?;

        let mut api_key = HeaderValue::from_str(api_key)?;
        api_key.set_sensitive(true);

        Ok(RequestExecutor {
            client,
            api_key,
            retry,
        })
    }

    /// Executes `request` and decodes a 200 body as `T`.
    ///
    /// Returns `Ok(None)` for 404. Timeouts, connection failures, 429 and 5xx
    /// are retried up to the configured attempt ceiling; anything else fails
    /// immediately.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Option<T>> {
        let started = Instant::now();
        let result = self
            .send_with_retry(request)
            .await
            .and_then(|response| decode(request, response));

        let outcome = match &result {
            Ok(Some(_)) => "ok",
            Ok(None) => "not_found",
            Err(e) => e.kind(),
        };
        counter!(UPSTREAM_REQUESTS, "endpoint" => request.endpoint.as_str(), "outcome" => outcome)
            .increment(1);
        histogram!(UPSTREAM_REQUEST_DURATION, "endpoint" => request.endpoint.as_str())
            .record(started.elapsed().as_secs_f64());

        result
    }

    async fn send_with_retry(&self, request: &ApiRequest) -> Result<RawResponse> {
        let mut attempt = 1;

        loop {
            let (error, retry_after) = match self.send_once(request).await {
                Ok(response) => match classify_status(request.endpoint, &response) {
                    Some(error) => (error, response.retry_after),
                    None => return Ok(response),
                },
                Err(error) => (error, None),
            };

            if !error.is_retryable() || attempt >= self.retry.max_attempts {
                return Err(error);
            }

            let delay = self.retry.backoff_delay(attempt, retry_after);
            tracing::warn!(
                endpoint = %request.endpoint,
                path = request.url.path(),
                attempt,
                max_attempts = self.retry.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Upstream request failed, retrying"
            );
            counter!(UPSTREAM_RETRIES, "endpoint" => request.endpoint.as_str()).increment(1);

            sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<RawResponse> {
        let builder = self
            .client
            .get(request.url.clone())
            .header(ACCEPT, "application/json");

        let builder = match &request.auth {
            Auth::ApiKey => builder.header(API_KEY_HEADER, self.api_key.clone()),
            Auth::Bearer(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| ApiError::InvalidHeader(e.to_string()))?;
                value.set_sensitive(true);
                builder.header(AUTHORIZATION, value)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(request.endpoint, e))?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(request.endpoint, e))?;

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

fn transport_error(endpoint: Endpoint, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout { endpoint }
    } else {
        // Strip the URL so error messages stay free of query parameters
        ApiError::ConnectionFailure {
            endpoint,
            message: error.without_url().to_string(),
        }
    }
}

/// Retryable statuses become errors here; everything else is left to `decode`.
fn classify_status(endpoint: Endpoint, response: &RawResponse) -> Option<ApiError> {
    let status = response.status;
    if status == StatusCode::TOO_MANY_REQUESTS {
        Some(ApiError::RateLimited { endpoint })
    } else if status.is_server_error() {
        Some(ApiError::ServerFault {
            endpoint,
            status: status.as_u16(),
            body: response.body.clone(),
        })
    } else {
        None
    }
}

fn decode<T: DeserializeOwned>(
    request: &ApiRequest,
    response: RawResponse,
) -> Result<Option<T>> {
    let endpoint = request.endpoint;
    match response.status {
        StatusCode::OK => serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|e| ApiError::ParseFailure {
                endpoint,
                message: e.to_string(),
            }),
        StatusCode::NOT_FOUND => {
            tracing::warn!(endpoint = %endpoint, path = request.url.path(), "Upstream returned 404 Not Found");
            Ok(None)
        }
        status => {
            tracing::error!(
                endpoint = %endpoint,
                path = request.url.path(),
                status = status.as_u16(),
                body = %response.body,
                "Upstream request failed"
            );
            Err(ApiError::ClientFault {
                endpoint,
                status: status.as_u16(),
                body: response.body,
            })
        }
    }
}

/// Only the delta-seconds form is honoured; HTTP dates are ignored.
fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{MockResponse, MockUpstream};
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Payload {
        value: i32,
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 10,
            jitter_min_ms: 1,
            jitter_max_ms: 5,
            min_retry_after_ms: 20,
        }
    }

    fn executor(retry: RetryPolicy) -> RequestExecutor {
        RequestExecutor::new("RGAPI-secret", "test-agent", retry, &Timeouts::default()).unwrap()
    }

    fn request(upstream: &MockUpstream, path: &str) -> ApiRequest {
        ApiRequest::new(Endpoint::MatchDetails, upstream.url(path))
    }

    #[tokio::test]
    async fn test_success_sends_api_key() {
        let upstream = MockUpstream::start(|_path, _hit| MockResponse::json(r#"{"value": 7}"#)).await;

        let result: Option<Payload> = executor(fast_retry())
            .execute(&request(&upstream, "/ok"))
            .await
            .unwrap();

        assert_eq!(result, Some(Payload { value: 7 }));
        assert_eq!(upstream.hits("/ok"), 1);
        assert_eq!(
            upstream.last_header("/ok", "x-riot-token").as_deref(),
            Some("RGAPI-secret")
        );
        assert_eq!(
            upstream.last_header("/ok", "user-agent").as_deref(),
            Some("test-agent")
        );
    }

    #[tokio::test]
    async fn test_bearer_auth_replaces_api_key() {
        let upstream = MockUpstream::start(|_path, _hit| MockResponse::json(r#"{"value": 1}"#)).await;
        let request = ApiRequest::with_bearer(Endpoint::SummonerMe, upstream.url("/me"), "tok");

        let _: Option<Payload> = executor(fast_retry()).execute(&request).await.unwrap();

        assert_eq!(
            upstream.last_header("/me", "authorization").as_deref(),
            Some("Bearer tok")
        );
        assert_eq!(upstream.last_header("/me", "x-riot-token"), None);
    }

    #[tokio::test]
    async fn test_not_found_is_absent() {
        let upstream = MockUpstream::start(|_path, _hit| MockResponse::status(404)).await;

        let result: Option<Payload> = executor(fast_retry())
            .execute(&request(&upstream, "/missing"))
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(upstream.hits("/missing"), 1);
    }

    #[tokio::test]
    async fn test_server_errors_retry_then_succeed() {
        let upstream = MockUpstream::start(|_path, hit| {
            if hit < 3 {
                MockResponse::status(503)
            } else {
                MockResponse::json(r#"{"value": 3}"#)
            }
        })
        .await;

        let result: Option<Payload> = executor(fast_retry())
            .execute(&request(&upstream, "/flaky"))
            .await
            .unwrap();

        assert_eq!(result, Some(Payload { value: 3 }));
        assert_eq!(upstream.hits("/flaky"), 3);
    }

    #[tokio::test]
    async fn test_retry_ceiling() {
        let upstream = MockUpstream::start(|_path, _hit| MockResponse::status(500)).await;

        let result: Result<Option<Payload>> = executor(fast_retry())
            .execute(&request(&upstream, "/down"))
            .await;

        assert!(matches!(
            result,
            Err(ApiError::ServerFault { status: 500, .. })
        ));
        assert_eq!(upstream.hits("/down"), 3);
    }

    #[tokio::test]
    async fn test_rate_limited_honours_retry_after() {
        let upstream = MockUpstream::start(|_path, _hit| {
            MockResponse::status(429).with_header("retry-after", "0")
        })
        .await;

        let started = Instant::now();
        let result: Result<Option<Payload>> = executor(fast_retry())
            .execute(&request(&upstream, "/limited"))
            .await;

        assert!(matches!(result, Err(ApiError::RateLimited { .. })));
        assert_eq!(upstream.hits("/limited"), 3);
        // Two delays, each raised to the 20ms floor
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_client_fault_is_terminal() {
        let upstream = MockUpstream::start(|_path, _hit| {
            MockResponse::status(403).with_body(r#"{"status": "Forbidden"}"#)
        })
        .await;

        let result: Result<Option<Payload>> = executor(fast_retry())
            .execute(&request(&upstream, "/forbidden"))
            .await;

        match result {
            Err(ApiError::ClientFault { status, body, .. }) => {
                assert_eq!(status, 403);
                assert!(body.contains("Forbidden"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(upstream.hits("/forbidden"), 1);
    }

    #[tokio::test]
    async fn test_parse_failure_is_terminal() {
        let upstream = MockUpstream::start(|_path, _hit| MockResponse::json("not json")).await;

        let result: Result<Option<Payload>> = executor(fast_retry())
            .execute(&request(&upstream, "/garbage"))
            .await;

        assert!(matches!(result, Err(ApiError::ParseFailure { .. })));
        assert_eq!(upstream.hits("/garbage"), 1);
    }

    #[tokio::test]
    async fn test_connection_failure_is_retried() {
        // Bind and drop a listener to get a port nobody is listening on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{port}/gone")).unwrap();
        let result: Result<Option<Payload>> = executor(fast_retry())
            .execute(&ApiRequest::new(Endpoint::Account, url))
            .await;

        assert!(matches!(
            result,
            Err(ApiError::ConnectionFailure { .. }) | Err(ApiError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_request_timeout_is_retryable() {
        let upstream = MockUpstream::start_slow(Duration::from_secs(3), |_path, _hit| {
            MockResponse::json(r#"{"value": 1}"#)
        })
        .await;

        let timeouts = Timeouts {
            connect_secs: 1,
            request_secs: 1,
        };
        let retry = RetryPolicy {
            max_attempts: 2,
            ..fast_retry()
        };
        let executor = RequestExecutor::new("key", "agent", retry, &timeouts).unwrap();

        let result: Result<Option<Payload>> =
            executor.execute(&request(&upstream, "/slow")).await;

        assert!(matches!(result, Err(ApiError::Timeout { .. })));
        assert_eq!(upstream.hits("/slow"), 2);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(
            parse_retry_after(Some(&HeaderValue::from_static("5"))),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            parse_retry_after(Some(&HeaderValue::from_static(" 2 "))),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            parse_retry_after(Some(&HeaderValue::from_static(
                "Wed, 21 Oct 2015 07:28:00 GMT"
            ))),
            None
        );
        assert_eq!(parse_retry_after(None), None);
    }
}
