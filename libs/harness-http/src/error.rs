use thiserror::Error;

/// Errors raised while preparing HTTP requests.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
