//! Structural lookups over scraped markup.
//!
//! Every lookup degrades to `None` or an empty list when the page does not
//! match; a redesigned page produces empty results rather than an error.
//! [`Html`] is not `Send`, so documents are parsed and consumed inside
//! synchronous functions and never held across an `.await`.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::model::Region;

static SERVER_ITEM: LazyLock<Selector> =
    LazyLock::new(|| selector("div.ags-ServerStatus-content-serverStatuses-server-item"));
static SERVER_LABEL: LazyLock<Selector> =
    LazyLock::new(|| selector("span.ags-ServerStatus-content-serverStatuses-server-item-label"));
static SERVER_ICON: LazyLock<Selector> = LazyLock::new(|| selector("svg"));
static ARTICLE_CARD: LazyLock<Selector> = LazyLock::new(|| selector("div.ags-SlotModule"));
static CARD_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.ags-SlotModule-slotLink"));
static CARD_TITLE: LazyLock<Selector> =
    LazyLock::new(|| selector(".ags-SlotModule-slotLink-info-heading--blog"));
static CARD_CATEGORY: LazyLock<Selector> =
    LazyLock::new(|| selector(".ags-SlotModule-slotLink-info-subheading--featured"));
static CARD_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(".ags-SlotModule-slotLink-info-text--blog"));
static ARTICLE_BODY: LazyLock<Selector> = LazyLock::new(|| selector("article"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

pub fn parse(markup: &str) -> Html {
    Html::parse_document(markup)
}

/// The `div` whose `data-regionid` equals the region's key.
pub fn region_container(doc: &Html, region: Region) -> Option<ElementRef<'_>> {
    let css = format!(r#"div[data-regionid="{}"]"#, region.key());
    let sel = Selector::parse(&css).ok()?;
    doc.select(&sel).next()
}

/// Server rows under a region container, in document order.
pub fn server_items(container: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    container.select(&SERVER_ITEM).collect()
}

/// Trimmed label text; `None` when the label is missing or blank.
pub fn server_name(item: ElementRef<'_>) -> Option<String> {
    item.select(&SERVER_LABEL)
        .next()
        .map(text_of)
        .filter(|name| !name.is_empty())
}

/// Inner markup of the row's status icon.
pub fn server_icon(item: ElementRef<'_>) -> Option<String> {
    item.select(&SERVER_ICON).next().map(|svg| svg.inner_html())
}

/// Article cards on a news listing page, in document order.
pub fn article_cards(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.select(&ARTICLE_CARD).collect()
}

/// Raw fields of one article card; any of them may be absent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CardFields {
    pub href: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

pub fn card_fields(card: ElementRef<'_>) -> CardFields {
    let field = |sel: &Selector| {
        card.select(sel)
            .next()
            .map(text_of)
            .filter(|text| !text.is_empty())
    };

    CardFields {
        href: card
            .select(&CARD_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string),
        title: field(&CARD_TITLE),
        category: field(&CARD_CATEGORY),
        description: field(&CARD_DESCRIPTION),
    }
}

/// Text of the first `article` element: each line trimmed, blank lines
/// dropped. `None` when there is no article or it holds no text.
pub fn article_body(doc: &Html) -> Option<String> {
    let article = doc.select(&ARTICLE_BODY).next()?;
    let raw: String = article.text().collect();
    let body = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!body.is_empty()).then_some(body)
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
