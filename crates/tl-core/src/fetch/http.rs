use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{FetchError, PageFetcher, RetryPolicy};
use crate::config::ScraperConfig;
use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("tl-status/", env!("CARGO_PKG_VERSION"));

/// HTTP page fetcher with connection pooling and an injected retry policy.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Self::build_client(timeout)?;
        Ok(Self { client, retry })
    }

    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Self::new(config.request_timeout, config.retry)
    }

    pub fn build_client(timeout: Duration) -> Result<Client> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5).min(timeout))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let max_retries = self.retry.max_retries();
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let backoff = self.retry.backoff(attempt);
                debug!(url, attempt, backoff_ms = backoff.as_millis(), "Retrying page fetch");
                tokio::time::sleep(backoff).await;
            }

            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(url, bytes = body.len(), "Fetched page");
                    return Ok(body);
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "Page fetch failed");
                    if attempt >= max_retries || !e.is_retryable() {
                        return Err(e);
                    }
                }
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_returns_body_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5), RetryPolicy::None).unwrap();
        let body = fetcher
            .fetch(&format!("{}/status", server.uri()))
            .await
            .unwrap();
        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn fetch_fails_on_404_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(
            Duration::from_secs(5),
            RetryPolicy::exponential(3, Duration::from_millis(10)),
        )
        .unwrap();
        let url = format!("{}/missing", server.uri());
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.url(), url);
    }

    #[tokio::test]
    async fn default_policy_makes_a_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5), RetryPolicy::None).unwrap();
        let err = fetcher
            .fetch(&format!("{}/flaky", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(500));
    }

    #[tokio::test]
    async fn exponential_policy_retries_on_500_then_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/retry"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/retry"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(
            Duration::from_secs(5),
            RetryPolicy::exponential(3, Duration::from_millis(10)),
        )
        .unwrap();
        let body = fetcher
            .fetch(&format!("{}/retry", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "recovered");
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_millis(100), RetryPolicy::None).unwrap();
        let err = fetcher
            .fetch(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "{:?}", err);
    }
}
