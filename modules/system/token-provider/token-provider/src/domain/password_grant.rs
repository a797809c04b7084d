//! OAuth2 resource-owner password-credentials exchange.

use chrono::Utc;
use harness_http::{HttpError, Retryable, RetryPolicy};
use harness_security::Identity;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use token_provider_sdk::{AuthError, TokenRecord};
use url::Url;

use crate::config::TokenProviderConfig;
use crate::domain::error::DomainError;

/// Successful token endpoint response. `expires_in` is kept loose because
/// providers disagree on its type.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<serde_json::Value>,
    refresh_token: Option<String>,
}

/// RFC 6749 error body.
#[derive(Deserialize, Default)]
#[serde(default)]
struct OAuthErrorBody {
    error: String,
    error_description: Option<String>,
}

/// One failed attempt at the token endpoint.
#[derive(Debug)]
enum Attempt {
    Transport(reqwest::Error),
    Server(StatusCode),
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{e}"),
            Self::Server(status) => write!(f, "provider returned {status}"),
        }
    }
}

impl Retryable for Attempt {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::Server(_) => true,
        }
    }
}

pub struct PasswordGrant {
    client: Client,
    endpoint: Url,
    client_id: String,
    client_secret: Option<SecretString>,
    retry: RetryPolicy,
}

impl PasswordGrant {
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidIdpUrl`] when the provider URL cannot be
    /// turned into a token endpoint.
    pub fn new(
        client: Client,
        cfg: &TokenProviderConfig,
        retry: RetryPolicy,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            client,
            endpoint: token_endpoint(&cfg.idp_url, &cfg.realm)?,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            retry,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Exchange the identity's credentials for a fresh token.
    ///
    /// # Errors
    ///
    /// See [`token_provider_sdk::TokenProviderClient::authenticate`].
    #[tracing::instrument(skip_all, fields(username = identity.username()))]
    pub async fn exchange(&self, identity: &Identity) -> Result<TokenRecord, AuthError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("username", identity.username()),
            ("password", identity.password().expose_secret()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.expose_secret()));
        }

        let response = self
            .retry
            .run("token_exchange", || {
                let request = self.client.post(self.endpoint.clone()).form(&form);
                async move {
                    let resp = request.send().await.map_err(Attempt::Transport)?;
                    if resp.status().is_server_error() {
                        return Err(Attempt::Server(resp.status()));
                    }
                    Ok(resp)
                }
            })
            .await
            .map_err(|e| AuthError::ProviderUnreachable(e.to_string()))?;

        let issued_at = Utc::now();
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::ProviderUnreachable(e.to_string()))?;

        if status.is_success() {
            let record = parse_token_response(&body, issued_at)?;
            tracing::debug!(expires_at = %record.expires_at, "token issued");
            return Ok(record);
        }

        let err: OAuthErrorBody = serde_json::from_slice(&body).unwrap_or_default();
        let detail = match (err.error.is_empty(), err.error_description) {
            (true, _) => format!("HTTP {}", status.as_u16()),
            (false, Some(desc)) => format!("{}: {desc}", err.error),
            (false, None) => err.error,
        };

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(AuthError::InvalidCredentials {
                    username: identity.username().to_owned(),
                    detail,
                })
            }
            _ => Err(AuthError::MalformedResponse(format!(
                "unexpected status {}: {detail}",
                status.as_u16()
            ))),
        }
    }
}

/// `<idp>/realms/<realm>/protocol/openid-connect/token`
///
/// # Errors
///
/// Returns [`DomainError::InvalidIdpUrl`] for unparsable or non-hierarchical
/// URLs.
pub fn token_endpoint(idp_url: &str, realm: &str) -> Result<Url, DomainError> {
    let base = Url::parse(idp_url).map_err(|e| DomainError::InvalidIdpUrl {
        url: idp_url.to_owned(),
        reason: e.to_string(),
    })?;
    harness_http::endpoint(
        &base,
        &["realms", realm, "protocol", "openid-connect", "token"],
    )
    .map_err(|e| match e {
        HttpError::InvalidUrl { url, reason } => DomainError::InvalidIdpUrl { url, reason },
        other @ HttpError::ClientBuild(_) => DomainError::Http(other),
    })
}

fn parse_token_response(
    body: &[u8],
    issued_at: chrono::DateTime<Utc>,
) -> Result<TokenRecord, AuthError> {
    let parsed: TokenResponse = serde_json::from_slice(body)
        .map_err(|e| AuthError::MalformedResponse(format!("token response: {e}")))?;

    let access_token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::MalformedResponse("missing access_token".to_owned()))?;

    let expires_in = parsed.expires_in.as_ref().and_then(lifetime_secs);
    if expires_in.is_none_or(|secs| secs <= 0) {
        tracing::warn!("token response carries no usable expires_in; token will not be reused");
    }

    Ok(TokenRecord::with_lifetime(
        SecretString::from(access_token),
        parsed.refresh_token.map(SecretString::from),
        issued_at,
        expires_in,
    ))
}

/// Accepts integers, floats (truncated) and numeric strings.
#[allow(clippy::cast_possible_truncation)]
fn lifetime_secs(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < 1e12)
                .map(|f| f.trunc() as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
