//! TOML configuration file schema and parsing.
//!
//! Every section is optional:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! log_format = "json"
//!
//! [source]
//! request_timeout_ms = 8000
//! max_retries = 2
//! retry_backoff_ms = 500
//!
//! [monitor]
//! region = "europe"
//! check_interval_secs = 3600
//! reset_interval_secs = 604800
//!
//! [notify]
//! webhook_url = "https://hooks.example.com/tl"
//! channel_id = "123456789"
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use tl_core::{MonitorSchedule, Region, RetryPolicy, ScraperConfig, WebhookConfig};

const DEFAULT_STATUS_URL: &str =
    "https://www.playthroneandliberty.com/en-us/support/server-status";
const DEFAULT_NEWS_URL: &str = "https://www.playthroneandliberty.com/en-us/news-load-more?page=";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub notify: Option<NotifyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_format: default_log_format(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_status_url")]
    pub status_url: String,

    #[serde(default = "default_news_url")]
    pub news_url: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_news_limit")]
    pub news_limit: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            status_url: default_status_url(),
            news_url: default_news_url(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            news_limit: default_news_limit(),
        }
    }
}

fn default_status_url() -> String {
    DEFAULT_STATUS_URL.into()
}

fn default_news_url() -> String {
    DEFAULT_NEWS_URL.into()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_news_limit() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    #[serde(default = "default_reset_interval_secs")]
    pub reset_interval_secs: u64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            region: default_region(),
            check_interval_secs: default_check_interval_secs(),
            reset_interval_secs: default_reset_interval_secs(),
        }
    }
}

fn default_region() -> String {
    "europe".into()
}

fn default_check_interval_secs() -> u64 {
    60 * 60
}

fn default_reset_interval_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl MonitorSection {
    pub fn schedule(&self) -> MonitorSchedule {
        MonitorSchedule::default()
            .with_check_interval_secs(self.check_interval_secs)
            .with_reset_interval_secs(self.reset_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    pub channel_id: Option<String>,
    pub secret: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

impl NotifyConfig {
    /// Builds the webhook target. Both the URL and the channel id are required.
    pub fn to_webhook_config(&self) -> Result<WebhookConfig, String> {
        let url = self
            .webhook_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or("notify.webhook_url is not configured")?;
        let channel_id = self
            .channel_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or("notify.channel_id is not configured")?;

        let mut config = WebhookConfig::new(url, channel_id);
        config.secret = self.secret.clone();
        if let Some(t) = self.timeout_ms {
            config.timeout_ms = t;
        }
        if let Some(r) = self.max_retries {
            config.max_retries = r;
        }
        Ok(config)
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Region checked by the monitor. Valid once [`validate`](Self::validate) passed.
    pub fn region(&self) -> Result<Region, String> {
        self.monitor
            .region
            .parse::<Region>()
            .map_err(|e| e.to_string())
    }

    pub fn scraper_config(&self) -> Result<ScraperConfig, String> {
        let source = &self.source;
        let retry = RetryPolicy::exponential(
            source.max_retries,
            Duration::from_millis(source.retry_backoff_ms),
        );
        Ok(ScraperConfig::new(&source.status_url, &source.news_url)
            .with_request_timeout(source.request_timeout_ms)
            .with_retry(retry)
            .with_news_limit(source.news_limit)
            .with_default_region(self.region()?))
    }

    /// Webhook target for the monitor, or why there is none.
    pub fn webhook_config(&self) -> Result<WebhookConfig, String> {
        self.notify
            .as_ref()
            .ok_or_else(|| "No [notify] section configured".to_string())?
            .to_webhook_config()
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_http_url("source.status_url", &self.source.status_url)?;
        validate_http_url("source.news_url", &self.source.news_url)?;

        if self.source.request_timeout_ms == 0 {
            return Err("source.request_timeout_ms must be greater than 0".into());
        }
        if self.source.news_limit == 0 {
            return Err("source.news_limit must be greater than 0".into());
        }

        self.region()?;

        if self.monitor.check_interval_secs == 0 {
            return Err("monitor.check_interval_secs must be greater than 0".into());
        }
        if self.monitor.reset_interval_secs == 0 {
            return Err("monitor.reset_interval_secs must be greater than 0".into());
        }

        if let Some(url) = self.notify.as_ref().and_then(|n| n.webhook_url.as_deref()) {
            validate_http_url("notify.webhook_url", url)?;
        }

        match self.server.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    let parsed =
        url::Url::parse(value).map_err(|e| format!("Invalid {}: {} ({})", field, value, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("{} must use http or https: {}", field, value));
    }
    Ok(())
}
