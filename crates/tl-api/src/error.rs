use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl From<tl_core::Error> for ApiError {
    fn from(err: tl_core::Error) -> Self {
        let message = err.to_string();
        match err {
            tl_core::Error::InvalidRegion(_) => ApiError::BadRequest(message),
            tl_core::Error::NotFound(_) => ApiError::NotFound(message),
            tl_core::Error::Fetch(_) => ApiError::BadGateway(message),
            tl_core::Error::Config(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_kind, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        if status.is_server_error() {
            tracing::warn!(%status, %message, "Request failed");
        }

        let body = ErrorBody {
            error: error_kind.to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}
