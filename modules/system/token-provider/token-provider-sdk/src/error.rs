//! Error types for the token provider.

use thiserror::Error;

/// Errors that can occur while obtaining a token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider rejected the credentials (`invalid_grant`,
    /// `unauthorized_client`).
    #[error("invalid credentials for '{username}': {detail}")]
    InvalidCredentials { username: String, detail: String },

    /// The provider could not be reached or answered with a server error.
    #[error("identity provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// The provider answered, but not with a usable token response.
    #[error("malformed token response: {0}")]
    MalformedResponse(String),
}

impl AuthError {
    /// Short label used in reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials { .. } => "invalid_credentials",
            Self::ProviderUnreachable(_) => "provider_unreachable",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}
