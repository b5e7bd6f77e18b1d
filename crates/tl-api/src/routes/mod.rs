mod news;
mod status;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().merge(status::router()).merge(news::router())
}
