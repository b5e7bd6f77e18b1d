use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use tl_core::{format_articles, Article};

use crate::error::ApiError;
use crate::state::AppState;

const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct NewsResponse {
    pub count: usize,
    pub articles: Vec<Article>,
    pub text: String,
}

impl From<Vec<Article>> for NewsResponse {
    fn from(articles: Vec<Article>) -> Self {
        Self {
            count: articles.len(),
            text: format_articles(&articles),
            articles,
        }
    }
}

#[derive(Serialize)]
pub struct LatestUpdateResponse {
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/news", get(get_news))
        .route("/news/general", get(get_general_news))
        .route("/updates", get(get_updates))
        .route("/updates/latest", get(get_latest_update))
}

/// GET /api/v1/news?category=&limit=
async fn get_news(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<NewsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(state.service.config().news_limit);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let category = query.category.as_deref().filter(|c| !c.trim().is_empty());
    let articles = state.service.news(category, limit).await?;
    Ok(Json(articles.into()))
}

/// GET /api/v1/news/general
async fn get_general_news(State(state): State<AppState>) -> Result<Json<NewsResponse>, ApiError> {
    Ok(Json(state.service.general_news().await?.into()))
}

/// GET /api/v1/updates
async fn get_updates(State(state): State<AppState>) -> Result<Json<NewsResponse>, ApiError> {
    Ok(Json(state.service.updates().await?.into()))
}

/// GET /api/v1/updates/latest
async fn get_latest_update(
    State(state): State<AppState>,
) -> Result<Json<LatestUpdateResponse>, ApiError> {
    let text = state.service.latest_update().await?;
    Ok(Json(LatestUpdateResponse { text }))
}
