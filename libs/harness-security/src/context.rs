use std::collections::BTreeSet;

use secrecy::SecretString;

use crate::identity::Identity;

/// `SecurityContext` is what a probe runs under: who the caller is and the
/// bearer token it presents.
///
/// An anonymous context has no username and no token. Probes issued with it
/// omit the `Authorization` header entirely.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SecurityContext {
    /// Username of the identity, `None` for anonymous callers.
    username: Option<String>,
    #[serde(default)]
    roles: BTreeSet<String>,
    #[serde(default)]
    teams: BTreeSet<String>,
    /// Access token. Never serialized; `Debug` output is redacted.
    #[serde(skip)]
    bearer_token: Option<SecretString>,
}

impl SecurityContext {
    /// Create a new `SecurityContext` builder
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Context without identity or token.
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityContextBuilder::default().build()
    }

    /// Context for a registry identity holding `token`.
    #[must_use]
    pub fn for_identity(identity: &Identity, token: SecretString) -> Self {
        Self::builder()
            .username(identity.username())
            .roles(identity.roles().iter().cloned())
            .teams(identity.teams().iter().cloned())
            .bearer_token(token)
            .build()
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Username for display; anonymous callers render as `(anonymous)`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .unwrap_or(crate::constants::ANONYMOUS_USERNAME)
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[must_use]
    pub fn teams(&self) -> &BTreeSet<String> {
        &self.teams
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.bearer_token.is_none()
    }

    /// Get the bearer token to present to the resource API.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&SecretString> {
        self.bearer_token.as_ref()
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    username: Option<String>,
    roles: BTreeSet<String>,
    teams: BTreeSet<String>,
    bearer_token: Option<SecretString>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_owned());
        self
    }

    #[must_use]
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teams = teams.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            username: self.username,
            roles: self.roles,
            teams: self.teams,
            bearer_token: self.bearer_token,
        }
    }
}
