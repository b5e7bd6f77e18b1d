#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod monitor;
pub mod scrape;
pub mod service;
pub mod webhook;

pub use config::ScraperConfig;
pub use error::{Error, Result};
pub use fetch::{FetchError, HttpFetcher, PageFetcher, RetryPolicy};
pub use format::{format_articles, format_check, format_region, format_status, split_for_transport};
pub use monitor::{run_schedule, Monitor, MonitorSchedule, MonitorState, TickOutcome};
pub use scrape::{
    Article, ColorClassifier, Region, RegionSnapshot, ServerEntry, ServerStatus,
    StatusClassifier, StatusReport,
};
pub use service::StatusService;
pub use webhook::{
    notification_channel, Notification, NotificationDispatcher, NotificationKind, Notifier,
    NotifyError, WebhookConfig, WebhookNotifier, WebhookPayload,
};
