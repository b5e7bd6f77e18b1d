use tracing::debug;
use url::Url;

use super::extract;
use super::model::Article;
use crate::fetch::{FetchError, PageFetcher};

pub const GENERAL_CATEGORY: &str = "General";
pub const UPDATES_CATEGORY: &str = "Updates";

/// The listing rarely has useful content past its second page.
pub const MAX_PAGES: u32 = 2;

/// Extracts complete article cards from one listing page.
///
/// Cards missing any field, or whose link cannot be resolved against
/// `page_url`, are dropped.
pub fn parse_articles(markup: &str, page_url: &str) -> Vec<Article> {
    let base = Url::parse(page_url).ok();
    let doc = extract::parse(markup);

    extract::article_cards(&doc)
        .into_iter()
        .filter_map(|card| {
            let fields = extract::card_fields(card);
            let link = resolve_link(base.as_ref(), &fields.href?)?;
            Some(Article {
                link,
                title: fields.title?,
                category: fields.category?,
                description: fields.description?,
            })
        })
        .collect()
}

fn resolve_link(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

/// Walks listing pages `1..=MAX_PAGES` of `base_url`, stopping at the first
/// page without a complete article, then filters by category and truncates
/// to `limit` in discovery order.
pub async fn fetch_news(
    fetcher: &dyn PageFetcher,
    base_url: &str,
    category: Option<&str>,
    limit: usize,
) -> Result<Vec<Article>, FetchError> {
    let mut articles = Vec::new();

    for page in 1..=MAX_PAGES {
        let url = format!("{}{}", base_url, page);
        debug!(%url, page, "Fetching news page");

        let markup = fetcher.fetch(&url).await?;
        let found = parse_articles(&markup, &url);
        if found.is_empty() {
            debug!(page, "No articles on page, stopping");
            break;
        }
        articles.extend(found);
    }

    if let Some(category) = category {
        articles.retain(|a| a.in_category(category));
        debug!(category, count = articles.len(), "Filtered articles by category");
    }

    articles.truncate(limit);
    Ok(articles)
}
