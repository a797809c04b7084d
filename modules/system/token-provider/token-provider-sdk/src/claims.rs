//! Unverified view of access token claims.
//!
//! The harness never trusts these claims for decisions. They are read only
//! to warn when the provider's view of an identity drifts from the registry.

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::error::AuthError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenClaims {
    pub preferred_username: Option<String>,
    pub llamastack_roles: BTreeSet<String>,
    pub llamastack_teams: BTreeSet<String>,
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT without checking its signature.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedResponse`] when the token does not have
    /// three segments or the payload is not base64url-encoded JSON.
    pub fn decode_unverified(token: &str) -> Result<Self, AuthError> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_sig), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::MalformedResponse(
                "access token is not a three-part JWT".to_owned(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::MalformedResponse(format!("JWT payload: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::MalformedResponse(format!("JWT claims: {e}")))
    }
}
