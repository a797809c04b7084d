//! Public API trait for the token provider.

use async_trait::async_trait;
use harness_security::Identity;

use crate::error::AuthError;
use crate::models::{AuthOptions, TokenRecord};

/// Obtains access tokens for registry identities.
///
/// Implementations consult their token cache first (unless
/// `options.use_cache` is false) and fall back to the identity provider.
#[async_trait]
pub trait TokenProviderClient: Send + Sync {
    /// Return a token that is valid for at least the expiry buffer.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` if the provider rejects the username/password
    /// - `ProviderUnreachable` on transport failures or provider 5xx
    /// - `MalformedResponse` if the token response cannot be understood
    async fn authenticate(
        &self,
        identity: &Identity,
        options: AuthOptions,
    ) -> Result<TokenRecord, AuthError>;

    /// Drop any cached token for `identity`.
    async fn invalidate(&self, identity: &Identity);
}
