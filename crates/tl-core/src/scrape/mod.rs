pub mod classify;
pub mod extract;
pub mod model;
pub mod news;
pub mod status;

pub use classify::{classify, ColorClassifier, StatusClassifier};
pub use model::{Article, Region, RegionSnapshot, ServerEntry, ServerStatus, StatusReport};
pub use news::{fetch_news, parse_articles, GENERAL_CATEGORY, MAX_PAGES, UPDATES_CATEGORY};
pub use status::parse_status_page;
