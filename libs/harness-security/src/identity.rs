//! Synthetic identities and the registry they are loaded from.
//!
//! Identities are created once at process start and never mutated. Roles and
//! teams are unordered sets, so they are kept in `BTreeSet`s to make
//! comparisons and rendering deterministic.

use std::collections::BTreeSet;

use secrecy::SecretString;
use serde::Deserialize;

use crate::constants::{
    ADMIN_ROLE, DATA_TEAM, DEVELOPER_ROLE, ML_TEAM, PLATFORM_TEAM, USER_ROLE,
};

/// Errors raised while building or querying an [`IdentityRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("identity registry is empty")]
    Empty,

    #[error("identity with empty username")]
    EmptyUsername,

    #[error("duplicate identity '{0}'")]
    Duplicate(String),

    #[error("unknown identity '{0}'")]
    UnknownIdentity(String),
}

/// Identity entry as it appears in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub teams: Vec<String>,
}

impl IdentityConfig {
    #[must_use]
    pub fn new(username: &str, password: &str, roles: &[&str], teams: &[&str]) -> Self {
        Self {
            username: username.to_owned(),
            password: SecretString::from(password.to_owned()),
            roles: roles.iter().map(|r| (*r).to_owned()).collect(),
            teams: teams.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    /// The users provisioned in the `llamastack-demo` realm.
    #[must_use]
    pub fn demo_defaults() -> Vec<Self> {
        vec![
            Self::new("admin", "admin123", &[ADMIN_ROLE], &[PLATFORM_TEAM]),
            Self::new("developer", "dev123", &[DEVELOPER_ROLE], &[ML_TEAM]),
            Self::new("developer2", "dev123", &[DEVELOPER_ROLE], &[ML_TEAM]),
            Self::new("developer3", "dev123", &[DEVELOPER_ROLE], &[DATA_TEAM]),
            Self::new("user", "user123", &[USER_ROLE], &[DATA_TEAM]),
        ]
    }
}

/// A named synthetic user with policy-relevant attributes.
#[derive(Debug, Clone)]
pub struct Identity {
    username: String,
    password: SecretString,
    roles: BTreeSet<String>,
    teams: BTreeSet<String>,
}

impl Identity {
    #[must_use]
    pub fn new<R, T>(username: &str, password: SecretString, roles: R, teams: T) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            username: username.to_owned(),
            password,
            roles: roles.into_iter().map(Into::into).collect(),
            teams: teams.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn from_config(cfg: &IdentityConfig) -> Self {
        Self::new(
            &cfg.username,
            cfg.password.clone(),
            cfg.roles.iter().cloned(),
            cfg.teams.iter().cloned(),
        )
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
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
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Copy of this identity with a different credential (interactive entry).
    #[must_use]
    pub fn with_password(&self, password: SecretString) -> Self {
        Self {
            password,
            ..self.clone()
        }
    }
}

/// Fixed, ordered set of identities known to the harness.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    identities: Vec<Identity>,
}

impl IdentityRegistry {
    /// Build a registry from configuration entries, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty list, an empty username or a duplicate
    /// username.
    pub fn from_configs(configs: &[IdentityConfig]) -> Result<Self, RegistryError> {
        if configs.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut identities: Vec<Identity> = Vec::with_capacity(configs.len());
        for cfg in configs {
            if cfg.username.trim().is_empty() {
                return Err(RegistryError::EmptyUsername);
            }
            if identities.iter().any(|i| i.username == cfg.username) {
                return Err(RegistryError::Duplicate(cfg.username.clone()));
            }
            identities.push(Identity::from_config(cfg));
        }

        Ok(Self { identities })
    }

    /// Registry of the demo realm users.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            identities: IdentityConfig::demo_defaults()
                .iter()
                .map(Identity::from_config)
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, username: &str) -> Option<&Identity> {
        self.identities.iter().find(|i| i.username == username)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Resolve the requested usernames, or every identity when none are given.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownIdentity`] for a username that is not
    /// in the registry.
    pub fn select(&self, usernames: &[String]) -> Result<Vec<Identity>, RegistryError> {
        if usernames.is_empty() {
            return Ok(self.identities.clone());
        }

        let mut selected: Vec<Identity> = Vec::with_capacity(usernames.len());
        for name in usernames {
            let identity = self
                .get(name)
                .ok_or_else(|| RegistryError::UnknownIdentity(name.clone()))?;
            if !selected.iter().any(|i| i.username == identity.username) {
                selected.push(identity.clone());
            }
        }
        Ok(selected)
    }
}
