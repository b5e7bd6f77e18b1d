use thiserror::Error;

use crate::fetch::FetchError;

/// Errors surfaced by the scraping engine.
///
/// Missing markup is never an error: selectors that match nothing degrade to
/// empty results. Only transport failures, bad input, and absent content
/// that a caller explicitly asked for end up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::InvalidRegion(_) => "invalid_region",
            Self::NotFound(_) => "not_found",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
