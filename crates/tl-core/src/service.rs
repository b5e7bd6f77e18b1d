use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::config::ScraperConfig;
use crate::error::{Error, Result};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::scrape::{
    extract, fetch_news, parse_status_page, Article, ColorClassifier, Region, StatusClassifier,
    StatusReport, GENERAL_CATEGORY, UPDATES_CATEGORY,
};

/// On-demand queries over the status page and the news listing.
///
/// Shared by the monitor and by request handlers; it holds no monitor state.
pub struct StatusService {
    config: ScraperConfig,
    fetcher: Arc<dyn PageFetcher>,
    classifier: Arc<dyn StatusClassifier>,
    last_observed: Mutex<Option<DateTime<Utc>>>,
}

impl StatusService {
    pub fn new(config: ScraperConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config,
            fetcher,
            classifier: Arc::new(ColorClassifier),
            last_observed: Mutex::new(None),
        }
    }

    pub fn from_config(config: ScraperConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::from_config(&config)?);
        Ok(Self::new(config, fetcher))
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn StatusClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Status for one region, or every region when `region` is `None`.
    #[instrument(level = "debug", skip(self))]
    pub async fn server_status(&self, region: Option<Region>) -> Result<StatusReport> {
        let regions: Vec<Region> = match region {
            Some(r) => vec![r],
            None => Region::ALL.to_vec(),
        };

        let markup = self.fetcher.fetch(&self.config.status_url).await?;
        let report = parse_status_page(&markup, &regions, self.classifier.as_ref(), self.stamp());

        info!(
            requested = regions.len(),
            found = report.len(),
            "Parsed server status"
        );
        Ok(report)
    }

    /// Like [`server_status`](Self::server_status) but takes a region key.
    /// An unknown key fails before anything is fetched.
    pub async fn server_status_by_name(&self, region: Option<&str>) -> Result<StatusReport> {
        let region = region.map(str::parse::<Region>).transpose()?;
        self.server_status(region).await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn news(&self, category: Option<&str>, limit: usize) -> Result<Vec<Article>> {
        let articles = fetch_news(self.fetcher.as_ref(), &self.config.news_url, category, limit).await?;
        debug!(count = articles.len(), "Collected articles");
        Ok(articles)
    }

    pub async fn general_news(&self) -> Result<Vec<Article>> {
        self.news(Some(GENERAL_CATEGORY), self.config.news_limit).await
    }

    pub async fn updates(&self) -> Result<Vec<Article>> {
        self.news(Some(UPDATES_CATEGORY), self.config.news_limit).await
    }

    /// Body text of the most recent update article.
    pub async fn latest_update(&self) -> Result<String> {
        let latest = self
            .updates()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound("No updates found".into()))?;

        let markup = self.fetcher.fetch(&latest.link).await?;
        let body = extract::article_body(&extract::parse(&markup))
            .ok_or_else(|| Error::NotFound(format!("No article found at {}", latest.link)))?;

        debug!(link = %latest.link, chars = body.len(), "Found latest update");
        Ok(body)
    }

    /// Current time, never earlier than a stamp this service already issued.
    fn stamp(&self) -> DateTime<Utc> {
        let mut last = self
            .last_observed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = match *last {
            Some(prev) if prev > Utc::now() => prev,
            _ => Utc::now(),
        };
        *last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::fetch::FetchError;
    use crate::scrape::ServerStatus;

    const STATUS_URL: &str = "https://game.test/status";
    const NEWS_URL: &str = "https://game.test/news?page=";

    struct MapFetcher {
        pages: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl MapFetcher {
        fn new(pages: &[(&str, String)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url).cloned().ok_or_else(|| FetchError::Http {
                url: url.to_string(),
                status: 404,
                message: "Not Found".into(),
            })
        }
    }

    fn service(fetcher: Arc<MapFetcher>) -> StatusService {
        StatusService::new(ScraperConfig::new(STATUS_URL, NEWS_URL), fetcher)
    }

    fn card(href: &str, title: &str, category: &str) -> String {
        format!(
            r#"<div class="ags-SlotModule"><a class="ags-SlotModule-slotLink" href="{href}"></a>
               <span class="ags-SlotModule-slotLink-info-heading--blog">{title}</span>
               <span class="ags-SlotModule-slotLink-info-subheading--featured">{category}</span>
               <span class="ags-SlotModule-slotLink-info-text--blog">About {title}</span></div>"#
        )
    }

    #[tokio::test]
    async fn invalid_region_fails_before_fetch() {
        let fetcher = Arc::new(MapFetcher::new(&[]));
        let svc = service(Arc::clone(&fetcher));
        let err = svc.server_status_by_name(Some("moon")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRegion(_)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn status_fetch_failure_propagates() {
        let fetcher = Arc::new(MapFetcher::new(&[]));
        let svc = service(fetcher);
        let err = svc.server_status(None).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Http { status: 404, .. })));
    }

    #[tokio::test]
    async fn observed_at_never_decreases() {
        let page = r##"<div data-regionid="europe"><div class="ags-ServerStatus-content-serverStatuses-server-item"><svg><circle fill="#24FF00"/></svg></div></div>"##;
        let fetcher = Arc::new(MapFetcher::new(&[(STATUS_URL, page.to_string())]));
        let svc = service(fetcher);

        let first = svc.server_status(Some(Region::Europe)).await.unwrap();
        let second = svc.server_status(Some(Region::Europe)).await.unwrap();
        assert!(second[&Region::Europe].observed_at >= first[&Region::Europe].observed_at);
        assert_eq!(first[&Region::Europe].servers[0].status, ServerStatus::Good);
    }

    struct FixedClassifier(ServerStatus);

    impl StatusClassifier for FixedClassifier {
        fn classify(&self, _token: &str) -> ServerStatus {
            self.0
        }
    }

    #[tokio::test]
    async fn injected_classifier_decides_status() {
        let page = r##"<div data-regionid="asia"><div class="ags-ServerStatus-content-serverStatuses-server-item"><span class="ags-ServerStatus-content-serverStatuses-server-item-label">Kr-1</span><svg><circle fill="#24FF00"/></svg></div></div>"##;
        let fetcher = Arc::new(MapFetcher::new(&[(STATUS_URL, page.to_string())]));
        let svc = service(fetcher).with_classifier(Arc::new(FixedClassifier(ServerStatus::Full)));

        let report = svc.server_status(Some(Region::Asia)).await.unwrap();
        let server = &report[&Region::Asia].servers[0];
        assert_eq!(server.name, "Kr-1");
        assert_eq!(server.status, ServerStatus::Full);
    }

    #[tokio::test]
    async fn general_news_filters_by_category() {
        let page1 = format!(
            "{}{}{}",
            card("/n/1", "Welcome", "General"),
            card("/n/2", "Patch", "Updates"),
            card("/n/3", "Roadmap", "general"),
        );
        let fetcher = Arc::new(MapFetcher::new(&[
            ("https://game.test/news?page=1", page1),
            ("https://game.test/news?page=2", String::new()),
        ]));
        let svc = service(fetcher);

        let news = svc.general_news().await.unwrap();
        let titles: Vec<_> = news.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Welcome", "Roadmap"]);
    }

    #[tokio::test]
    async fn latest_update_trims_each_line_and_drops_blank_lines() {
        let page1 = format!(
            "{}{}",
            card("/n/1", "Welcome", "General"),
            card("/n/patch-2", "Patch 2", "Updates"),
        );
        let fetcher = Arc::new(MapFetcher::new(&[
            ("https://game.test/news?page=1", page1),
            ("https://game.test/news?page=2", String::new()),
            (
                "https://game.test/n/patch-2",
                "<html><body><article>\n  <h1>Patch 2</h1>\n\n\n  <p>Balance changes</p>\n</article></body></html>".to_string(),
            ),
        ]));
        let svc = service(fetcher);

        let text = svc.latest_update().await.unwrap();
        assert_eq!(text, "Patch 2\nBalance changes");
    }

    #[tokio::test]
    async fn latest_update_without_updates_is_not_found() {
        let fetcher = Arc::new(MapFetcher::new(&[(
            "https://game.test/news?page=1",
            card("/n/1", "Welcome", "General"),
        ), (
            "https://game.test/news?page=2",
            String::new(),
        )]));
        let svc = service(fetcher);
        let err = svc.latest_update().await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m.contains("No updates")));
    }

    #[tokio::test]
    async fn latest_update_without_article_body_is_not_found() {
        let fetcher = Arc::new(MapFetcher::new(&[
            ("https://game.test/news?page=1", card("/n/9", "Patch 9", "Updates")),
            ("https://game.test/news?page=2", String::new()),
            ("https://game.test/n/9", "<html><body><div>moved</div></body></html>".to_string()),
        ]));
        let svc = service(fetcher);
        let err = svc.latest_update().await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m.contains("No article")));
    }
}
