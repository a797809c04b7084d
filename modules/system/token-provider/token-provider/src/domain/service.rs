//! Token provider service: cache lookup, password grant, cache refresh.

use std::sync::Arc;

use dashmap::DashMap;
use harness_http::{HttpClientConfig, RetryPolicy, build_client};
use harness_security::Identity;
use token_provider_sdk::{AuthError, AuthOptions, TokenClaims, TokenRecord};

use crate::config::TokenProviderConfig;
use crate::domain::cache::TokenCache;
use crate::domain::error::DomainError;
use crate::domain::password_grant::PasswordGrant;

pub struct Service {
    grant: PasswordGrant,
    cache: TokenCache,
    /// Serializes token acquisition per username.
    locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl Service {
    /// Build the provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the provider URL is invalid, the cache
    /// directory cannot be created, or the HTTP client cannot be constructed.
    pub fn from_config(
        cfg: &TokenProviderConfig,
        http: &HttpClientConfig,
    ) -> Result<Self, DomainError> {
        let client = build_client(http)?;
        let grant = PasswordGrant::new(client, cfg, RetryPolicy::from_config(http))?;
        let cache = TokenCache::new(cfg.resolved_cache_dir(), &cfg.idp_url, &cfg.realm);
        cache.ensure_dir()?;

        tracing::debug!(
            endpoint = %grant.endpoint(),
            cache_dir = %cache.dir().display(),
            "token provider ready"
        );
        Ok(Self::new(grant, cache))
    }

    #[must_use]
    pub fn new(grant: PasswordGrant, cache: TokenCache) -> Self {
        Self {
            grant,
            cache,
            locks: DashMap::new(),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    fn lock_for(&self, username: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .entry(username.to_owned())
            .or_default()
            .value()
            .clone()
    }

    /// Token for `identity`, from cache when allowed and still valid.
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError`] from the password grant.
    #[tracing::instrument(skip_all, fields(username = identity.username(), use_cache = options.use_cache))]
    pub async fn token_for(
        &self,
        identity: &Identity,
        options: AuthOptions,
    ) -> Result<TokenRecord, AuthError> {
        let lock = self.lock_for(identity.username());
        let _guard = lock.lock().await;

        if options.use_cache
            && let Some(record) = self.cache.get(identity.username())
        {
            tracing::debug!(
                remaining_secs = record.remaining_secs(chrono::Utc::now()),
                "using cached token"
            );
            return Ok(record);
        }

        let record = self.grant.exchange(identity).await?;
        warn_on_claim_drift(identity, &record);

        if let Err(e) = self.cache.put(identity.username(), &record) {
            tracing::warn!(error = %e, "could not cache token");
        }
        tracing::info!("authenticated");
        Ok(record)
    }

    /// Remove the cached token for `identity`.
    pub async fn forget(&self, identity: &Identity) {
        let lock = self.lock_for(identity.username());
        let _guard = lock.lock().await;
        if let Err(e) = self.cache.invalidate(identity.username()) {
            tracing::warn!(username = identity.username(), error = %e, "could not invalidate cached token");
        }
    }
}

/// Predictions use registry attributes; flag tokens that disagree.
fn warn_on_claim_drift(identity: &Identity, record: &TokenRecord) {
    use secrecy::ExposeSecret;

    let claims = match TokenClaims::decode_unverified(record.access_token.expose_secret()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "access token claims not inspectable");
            return;
        }
    };

    if let Some(name) = &claims.preferred_username
        && name != identity.username()
    {
        tracing::warn!(claimed = %name, "token preferred_username differs from identity");
    }
    if &claims.llamastack_roles != identity.roles() {
        tracing::warn!(
            claimed = ?claims.llamastack_roles,
            registry = ?identity.roles(),
            "token roles differ from registry; predictions use registry roles"
        );
    }
    if &claims.llamastack_teams != identity.teams() {
        tracing::warn!(
            claimed = ?claims.llamastack_teams,
            registry = ?identity.teams(),
            "token teams differ from registry; predictions use registry teams"
        );
    }
}
