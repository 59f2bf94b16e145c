//! HTTP client with rate limiting and retry logic shared by the metadata
//! sources.

use super::retry_policy::{is_retryable_error, RateLimitInfo, RetryPolicy};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::LogContext;
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::{sleep, Instant};

type DirectRateLimiter = GovernorRateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

const USER_AGENT: &str = concat!("anisource/", env!("CARGO_PKG_VERSION"));

/// HTTP client that handles rate limiting and retries
pub struct RateLimitClient {
    client: Client,
    rate_limiter: DirectRateLimiter,
    retry_policy: RetryPolicy,
    provider_name: String,
}

impl RateLimitClient {
    /// Client tuned for Jikan
    pub fn for_jikan() -> Self {
        // Jikan v4: ~60 req/min with 3 req/sec burst
        Self::new("Jikan", RetryPolicy::jikan(), 1.0, 3)
    }

    /// Client tuned for AniList
    pub fn for_anilist() -> Self {
        // AniList: 30 req/min while degraded
        Self::new("AniList", RetryPolicy::anilist(), 0.5, 2)
    }

    pub fn new(
        provider_name: &str,
        retry_policy: RetryPolicy,
        requests_per_second: f64,
        burst_size: u32,
    ) -> Self {
        Self {
            client: Client::new(),
            rate_limiter: Self::create_rate_limiter(requests_per_second, burst_size),
            retry_policy,
            provider_name: provider_name.to_string(),
        }
    }

    /// Replace the retry policy (tests use `RetryPolicy::none()`)
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Create a rate limiter with specified requests per second and burst capacity
    fn create_rate_limiter(requests_per_second: f64, burst_size: u32) -> DirectRateLimiter {
        let burst = NonZeroU32::new(burst_size).unwrap_or(NonZeroU32::MIN);
        let period = (requests_per_second > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / requests_per_second));
        let quota = period
            .and_then(Quota::with_period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        GovernorRateLimiter::direct(quota)
    }

    /// GET request with rate limiting and retries
    pub async fn get<T>(&self, url: &str) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.request_with_retries(Method::GET, url, None).await
    }

    /// POST request with JSON body
    pub async fn post_json<T>(&self, url: &str, body: &Value) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.request_with_retries(Method::POST, url, Some(body))
            .await
    }

    async fn request_with_retries<T>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let attempts = self.retry_policy.max_retries + 1;

        for attempt in 0..attempts {
            let is_last = attempt + 1 == attempts;
            self.rate_limiter.until_ready().await;

            let started = Instant::now();
            match self.send(&method, url, body).await {
                Ok(response) => {
                    let status = response.status();
                    LogContext::upstream_call(
                        &self.provider_name,
                        method.as_str(),
                        url,
                        status.as_u16(),
                        started.elapsed(),
                    );

                    if status.as_u16() == 429 {
                        if is_last {
                            return Err(AppError::RateLimitError(format!(
                                "{} API rate limit exceeded after {} attempts",
                                self.provider_name, attempts
                            )));
                        }
                        let info = RateLimitInfo::from_headers(response.headers());
                        let delay = self
                            .retry_policy
                            .calculate_delay(attempt, info.recommended_delay());
                        log::warn!(
                            "{} API rate limited (attempt {}/{}). Waiting {:?} before retry.",
                            self.provider_name,
                            attempt + 1,
                            attempts,
                            delay
                        );
                        sleep(delay).await;
                        continue;
                    }

                    if !status.is_success() {
                        let error_msg =
                            format!("{} API returned error: {}", self.provider_name, status);

                        if status.is_server_error() && !is_last {
                            let delay = self.retry_policy.calculate_delay(attempt, None);
                            log::warn!(
                                "{} (attempt {}/{}). Retrying in {:?}",
                                error_msg,
                                attempt + 1,
                                attempts,
                                delay
                            );
                            sleep(delay).await;
                            continue;
                        }

                        return Err(match status.as_u16() {
                            404 => AppError::NotFound(error_msg),
                            503 => AppError::UpstreamUnavailable(error_msg),
                            _ if status.is_server_error() => {
                                AppError::ExternalServiceError(error_msg)
                            }
                            _ => AppError::ApiError(error_msg),
                        });
                    }

                    return self.parse_response(response).await;
                }
                Err(e) => {
                    if is_retryable_error(&e) && !is_last {
                        let delay = self.retry_policy.calculate_delay(attempt, None);
                        log::warn!(
                            "{} API request failed (attempt {}/{}): {}. Retrying in {:?}",
                            self.provider_name,
                            attempt + 1,
                            attempts,
                            e,
                            delay
                        );
                        sleep(delay).await;
                        continue;
                    }
                    return Err(AppError::from(e));
                }
            }
        }

        Err(AppError::ExternalServiceError(format!(
            "{} API request failed after {} attempts",
            self.provider_name, attempts
        )))
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response, reqwest::Error> {
        let mut request_builder = self
            .client
            .request(method.clone(), url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json");

        if let Some(json_body) = body {
            request_builder = request_builder.json(json_body);
        }

        request_builder.send().await
    }

    async fn parse_response<T>(&self, response: Response) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response_text = response.text().await.map_err(|e| {
            AppError::SerializationError(format!(
                "Failed to read {} response: {}",
                self.provider_name, e
            ))
        })?;

        serde_json::from_str(&response_text).map_err(|e| {
            let preview: String = response_text.chars().take(200).collect();
            AppError::SerializationError(format!(
                "Failed to parse {} response: {}. Response: {}",
                self.provider_name, e, preview
            ))
        })
    }

    /// Check if a request can be made now (for testing/debugging)
    pub fn can_make_request_now(&self) -> bool {
        self.rate_limiter.check().is_ok()
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let jikan_client = RateLimitClient::for_jikan();
        assert_eq!(jikan_client.provider_name(), "Jikan");

        let anilist_client = RateLimitClient::for_anilist();
        assert_eq!(anilist_client.provider_name(), "AniList");
    }

    #[test]
    fn test_can_make_request() {
        let client = RateLimitClient::for_jikan();
        assert!(client.can_make_request_now());
    }

    #[test]
    fn test_zero_rate_falls_back_to_a_valid_quota() {
        let client = RateLimitClient::new("Test", RetryPolicy::none(), 0.0, 0);
        assert!(client.can_make_request_now());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error_not_a_panic() {
        let client = RateLimitClient::new("Test", RetryPolicy::none(), 100.0, 10);
        let result: AppResult<Value> = client.get("http://127.0.0.1:9/unreachable").await;
        assert!(result.is_err());
    }
}
