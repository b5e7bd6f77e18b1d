//! Notification delivery.
//!
//! The monitor pushes [`Notification`]s through an mpsc channel. The
//! [`NotificationDispatcher`] drains that channel and hands each one to a
//! [`Notifier`]; [`WebhookNotifier`] is the concrete transport, POSTing every
//! length-bounded segment of the message as JSON to the configured endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::format::{split_for_transport, MAX_SEGMENT_LEN};
use crate::scrape::Region;

/// Configuration for the webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// The URL to POST payloads to.
    pub url: String,

    /// Destination channel the endpoint should post into.
    pub channel_id: String,

    #[serde(default = "default_webhook_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_webhook_retries")]
    pub max_retries: u32,

    /// Optional HMAC-SHA256 signing secret for `X-TL-Signature-256` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    #[serde(default = "default_max_segment_len")]
    pub max_segment_len: usize,
}

fn default_webhook_timeout_ms() -> u64 {
    5000
}

fn default_webhook_retries() -> u32 {
    2
}

fn default_max_segment_len() -> usize {
    MAX_SEGMENT_LEN
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            channel_id: channel_id.into(),
            timeout_ms: default_webhook_timeout_ms(),
            max_retries: default_webhook_retries(),
            secret: None,
            max_segment_len: default_max_segment_len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Every server in the monitored region is Good; checks pause until reset.
    AllClear,
    /// At least one server is not Good.
    Status,
}

/// A message produced by the monitor for the outbound channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub region: Region,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, region: Region, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            region,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

pub fn notification_channel() -> (
    mpsc::UnboundedSender<Notification>,
    mpsc::UnboundedReceiver<Notification>,
) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("Failed to serialize payload: {0}")]
    Serialize(String),
}

/// Outbound transport for monitor notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// The JSON envelope POSTed for each segment of a notification.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub id: String,
    pub kind: NotificationKind,
    pub channel_id: String,
    pub region: Region,
    pub content: String,
    /// 1-based index of this segment.
    pub segment: usize,
    pub segments: usize,
    pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
    pub fn from_notification(notification: &Notification, channel_id: &str, max_len: usize) -> Vec<Self> {
        let parts = split_for_transport(&notification.content, max_len);
        let total = parts.len();
        parts
            .into_iter()
            .enumerate()
            .map(|(i, content)| Self {
                id: notification.id.clone(),
                kind: notification.kind,
                channel_id: channel_id.to_string(),
                region: notification.region,
                content,
                segment: i + 1,
                segments: total,
                timestamp: notification.timestamp,
            })
            .collect()
    }
}

pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payloads = WebhookPayload::from_notification(
            notification,
            &self.config.channel_id,
            self.config.max_segment_len,
        );
        let timeout = Duration::from_millis(self.config.timeout_ms);

        for payload in &payloads {
            let body =
                serde_json::to_vec(payload).map_err(|e| NotifyError::Serialize(e.to_string()))?;
            deliver(
                &self.client,
                &self.config.url,
                &body,
                self.config.secret.as_deref(),
                timeout,
                self.config.max_retries,
            )
            .await?;
            debug!(
                url = %self.config.url,
                segment = payload.segment,
                segments = payload.segments,
                "Webhook segment delivered"
            );
        }

        Ok(())
    }
}

/// Drains the notification channel into a [`Notifier`].
pub struct NotificationDispatcher {
    rx: mpsc::UnboundedReceiver<Notification>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(rx: mpsc::UnboundedReceiver<Notification>, notifier: Arc<dyn Notifier>) -> Self {
        Self { rx, notifier }
    }

    /// Run the dispatcher loop. Returns when all senders are dropped.
    pub async fn run(mut self) {
        debug!("Notification dispatcher started");

        while let Some(notification) = self.rx.recv().await {
            if let Err(e) = self.notifier.send(&notification).await {
                warn!(
                    id = %notification.id,
                    kind = ?notification.kind,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }

        debug!("Notification dispatcher shutting down");
    }
}

async fn deliver(
    client: &Client,
    url: &str,
    body: &[u8],
    secret: Option<&str>,
    timeout: Duration,
    max_retries: u32,
) -> Result<(), NotifyError> {
    let mut last_error = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff = Duration::from_millis(500 * 2u64.pow(attempt - 1));
            tokio::time::sleep(backoff).await;
        }

        let mut req = client
            .post(url)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .body(body.to_vec());

        if let Some(signature) = secret.and_then(|secret| sign_payload(body, secret)) {
            req = req.header("X-TL-Signature-256", format!("sha256={}", signature));
        }

        match req.send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            Ok(resp) => {
                let status = resp.status().as_u16();
                let err = NotifyError::Http {
                    url: url.to_string(),
                    status,
                };
                if (400..500).contains(&status) && status != 429 {
                    return Err(err);
                }
                last_error = Some(err);
            }
            Err(e) => {
                last_error = Some(NotifyError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(last_error.unwrap_or_else(|| NotifyError::Request {
        url: url.to_string(),
        reason: "no attempt made".into(),
    }))
}

fn sign_payload(body: &[u8], secret: &str) -> Option<String> {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        warn!("Webhook secret rejected as HMAC key, sending unsigned");
        return None;
    };
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}
