mod http;

pub use http::HttpFetcher;

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error {status} fetching {url}: {message}")]
    Http {
        url: String,
        status: u16,
        message: String,
    },
    #[error("Network error fetching {url}: {reason}")]
    Network { url: String, reason: String },
    #[error("Timeout fetching {url}")]
    Timeout { url: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. } | Self::Network { url, .. } | Self::Timeout { url } => url,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Client errors other than 429 will not change on a second attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => !((400..500).contains(status) && *status != 429),
            Self::Network { .. } | Self::Timeout { .. } => true,
        }
    }
}

/// How a fetcher reacts to a failed attempt. Defaults to a single attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryPolicy {
    #[default]
    None,
    Exponential {
        max_retries: u32,
        base_backoff: Duration,
    },
}

impl RetryPolicy {
    pub fn exponential(max_retries: u32, base_backoff: Duration) -> Self {
        if max_retries == 0 {
            return Self::None;
        }
        Self::Exponential {
            max_retries,
            base_backoff,
        }
    }

    pub fn max_retries(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Exponential { max_retries, .. } => *max_retries,
        }
    }

    /// Delay before retry number `attempt` (1-based): doubled each attempt,
    /// plus up to a quarter of the base as jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Exponential { base_backoff, .. } => {
                let exp = *base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1));
                let jitter_range = base_backoff.as_millis() as u64 / 4;
                let jitter = if jitter_range > 0 {
                    rand::thread_rng().gen_range(0..=jitter_range)
                } else {
                    0
                };
                exp + Duration::from_millis(jitter)
            }
        }
    }
}

/// Retrieves raw page markup for an absolute URL.
///
/// The trait is object-safe and Send + Sync so one fetcher can be shared by
/// the monitor and on-demand queries.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_not_retryable() {
        let not_found = FetchError::Http {
            url: "u".into(),
            status: 404,
            message: "Not Found".into(),
        };
        let throttled = FetchError::Http {
            url: "u".into(),
            status: 429,
            message: "Too Many Requests".into(),
        };
        let upstream = FetchError::Http {
            url: "u".into(),
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert!(!not_found.is_retryable());
        assert!(throttled.is_retryable());
        assert!(upstream.is_retryable());
        assert!(FetchError::Timeout { url: "u".into() }.is_retryable());
    }

    #[test]
    fn default_policy_never_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy, RetryPolicy::None);
        assert_eq!(policy.max_retries(), 0);
        assert_eq!(policy.backoff(1), Duration::ZERO);
    }

    #[test]
    fn zero_retries_collapses_to_none() {
        assert_eq!(
            RetryPolicy::exponential(0, Duration::from_millis(100)),
            RetryPolicy::None
        );
    }

    #[test]
    fn exponential_backoff_doubles_within_jitter() {
        let policy = RetryPolicy::exponential(3, Duration::from_millis(100));
        let first = policy.backoff(1);
        let third = policy.backoff(3);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(425));
    }

    #[test]
    fn error_exposes_url() {
        let err = FetchError::Network {
            url: "https://example.com/".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(err.url(), "https://example.com/");
        assert_eq!(err.status_code(), None);
    }
}
