//! Retry policies for upstream metadata APIs
//!
//! Delays grow exponentially per attempt, honor `Retry-After` when the
//! upstream sends it, and may carry a small random jitter.

use std::time::Duration;

/// Configuration for HTTP retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries (will be adjusted based on headers)
    pub base_delay: Duration,
    /// Maximum delay to wait (prevents excessive waits)
    pub max_delay: Duration,
    pub exponential_backoff: bool,
    pub backoff_multiplier: f64,
    /// Add up to 10% random delay on top of the computed backoff
    pub jitter: bool,
}

impl RetryPolicy {
    /// Conservative policy for Jikan (60 req/min limit)
    pub fn jikan() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(120),
            exponential_backoff: true,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Policy for AniList (90 req/min limit, 30 when degraded)
    pub fn anilist() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(700),
            max_delay: Duration::from_secs(60),
            exponential_backoff: true,
            backoff_multiplier: 1.5,
            jitter: true,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            exponential_backoff: false,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Calculate delay for next retry attempt
    pub fn calculate_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        // If server provided Retry-After header, respect it
        if let Some(server_delay) = retry_after {
            return server_delay.min(self.max_delay);
        }

        let delay = if self.exponential_backoff {
            let multiplier = self.backoff_multiplier.powi(attempt as i32);
            Duration::from_millis((self.base_delay.as_millis() as f64 * multiplier) as u64)
        } else {
            self.base_delay
        };
        let delay = delay.min(self.max_delay);

        if self.jitter {
            let jitter_ms = (delay.as_millis() as f64 * 0.1 * rand::random::<f64>()) as u64;
            delay + Duration::from_millis(jitter_ms)
        } else {
            delay
        }
    }
}

/// Information extracted from HTTP 429 responses
#[derive(Debug, Clone, Default)]
pub struct RateLimitInfo {
    /// How long to wait before next request (from Retry-After header)
    pub retry_after: Option<Duration>,
    /// When the rate limit resets (from X-RateLimit-Reset header)
    pub reset_time: Option<Duration>,
    pub remaining: Option<u32>,
    pub limit: Option<u32>,
}

impl RateLimitInfo {
    /// Parse rate limit information from HTTP response headers
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let header_u64 = |name: &str| {
            headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
        };

        let reset_time = header_u64("x-ratelimit-reset").map(|timestamp| {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            Duration::from_secs(timestamp.saturating_sub(now))
        });

        Self {
            retry_after: header_u64("retry-after").map(Duration::from_secs),
            reset_time,
            remaining: header_u64("x-ratelimit-remaining").map(|v| v as u32),
            limit: header_u64("x-ratelimit-limit").map(|v| v as u32),
        }
    }

    /// Get the best delay recommendation from available information
    pub fn recommended_delay(&self) -> Option<Duration> {
        self.retry_after.or(self.reset_time)
    }
}

/// Determines if a transport error is worth retrying
pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    match error.status() {
        Some(status) => matches!(status.as_u16(), 408 | 425 | 429 | 500..=599),
        // Network errors are potentially retryable
        None => error.is_timeout() || error.is_connect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn without_jitter(policy: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            jitter: false,
            ..policy
        }
    }

    #[test]
    fn test_jikan_policy() {
        let policy = RetryPolicy::jikan();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert!(policy.exponential_backoff);
    }

    #[test]
    fn test_calculate_delay_with_retry_after() {
        let policy = RetryPolicy::jikan();
        let delay = policy.calculate_delay(1, Some(Duration::from_secs(30)));
        assert_eq!(delay, Duration::from_secs(30));

        // Capped by max_delay
        let delay = policy.calculate_delay(1, Some(Duration::from_secs(600)));
        assert_eq!(delay, Duration::from_secs(120));
    }

    #[test]
    fn test_calculate_delay_exponential_backoff() {
        let policy = without_jitter(RetryPolicy::jikan());
        assert_eq!(policy.calculate_delay(0, None), Duration::from_secs(2));
        assert_eq!(policy.calculate_delay(1, None), Duration::from_secs(4));
        assert_eq!(policy.calculate_delay(2, None), Duration::from_secs(8));
        assert_eq!(policy.calculate_delay(10, None), Duration::from_secs(120));
    }

    #[test]
    fn test_jitter_stays_within_ten_percent() {
        let policy = RetryPolicy::anilist();
        for _ in 0..20 {
            let delay = policy.calculate_delay(0, None);
            assert!(delay >= Duration::from_millis(700));
            assert!(delay <= Duration::from_millis(770));
        }
    }

    #[test]
    fn test_none_policy_never_waits() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.calculate_delay(3, None), Duration::ZERO);
    }

    #[test]
    fn test_rate_limit_info_parsing() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("retry-after", "30".parse().unwrap());
        headers.insert("x-ratelimit-remaining", "0".parse().unwrap());
        headers.insert("x-ratelimit-limit", "90".parse().unwrap());

        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(info.retry_after, Some(Duration::from_secs(30)));
        assert_eq!(info.remaining, Some(0));
        assert_eq!(info.limit, Some(90));
        assert_eq!(info.recommended_delay(), Some(Duration::from_secs(30)));
    }
}
