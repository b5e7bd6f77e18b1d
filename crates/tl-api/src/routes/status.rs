use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tl_core::{format_status, Region, ServerStatus};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub region: Option<String>,
}

#[derive(Serialize)]
pub struct ServerView {
    pub name: String,
    pub status: ServerStatus,
    pub label: &'static str,
}

#[derive(Serialize)]
pub struct RegionView {
    pub region: Region,
    pub observed_at: DateTime<Utc>,
    pub servers: Vec<ServerView>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub regions: Vec<RegionView>,
    /// The same report rendered as chat-ready text.
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(get_status))
}

/// GET /api/v1/status?region=
async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let region = query.region.as_deref().filter(|r| !r.trim().is_empty());
    let report = state.service.server_status_by_name(region).await?;

    let text = format_status(&report);
    let regions = report
        .into_iter()
        .map(|(region, snapshot)| RegionView {
            region,
            observed_at: snapshot.observed_at,
            servers: snapshot
                .servers
                .into_iter()
                .map(|s| ServerView {
                    label: s.status.label(),
                    status: s.status,
                    name: s.name,
                })
                .collect(),
        })
        .collect();

    Ok(Json(StatusResponse { regions, text }))
}
