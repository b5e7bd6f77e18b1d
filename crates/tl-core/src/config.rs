use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetch::RetryPolicy;
use crate::scrape::Region;

/// Configuration for the scraping engine.
///
/// Source URLs are always injected by the caller; the engine has no
/// built-in knowledge of where the pages live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Server status page.
    pub status_url: String,
    /// News listing base URL; the page number is appended verbatim.
    pub news_url: String,
    /// HTTP request timeout for page fetches.
    pub request_timeout: Duration,
    /// Retry behaviour for failed fetches (default: single attempt).
    pub retry: RetryPolicy,
    /// Maximum number of articles returned by a news query.
    pub news_limit: usize,
    /// Region checked by the monitor.
    pub default_region: Region,
}

impl ScraperConfig {
    pub fn new(status_url: impl Into<String>, news_url: impl Into<String>) -> Self {
        Self {
            status_url: status_url.into(),
            news_url: news_url.into(),
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::None,
            news_limit: 5,
            default_region: Region::Europe,
        }
    }

    pub fn with_request_timeout(mut self, ms: u64) -> Self {
        self.request_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_news_limit(mut self, limit: usize) -> Self {
        self.news_limit = limit;
        self
    }

    pub fn with_default_region(mut self, region: Region) -> Self {
        self.default_region = region;
        self
    }
}
