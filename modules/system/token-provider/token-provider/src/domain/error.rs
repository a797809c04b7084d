//! Domain errors for the token provider.

use harness_http::HttpError;

use crate::domain::cache::CacheError;

/// Errors raised while constructing the provider.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("invalid identity provider URL '{url}': {reason}")]
    InvalidIdpUrl { url: String, reason: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Http(#[from] HttpError),
}
