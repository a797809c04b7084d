//! `TokenProviderClient` implementation backed by the domain service.

use async_trait::async_trait;
use harness_security::Identity;
use token_provider_sdk::{AuthError, AuthOptions, TokenProviderClient, TokenRecord};

use super::service::Service;

#[async_trait]
impl TokenProviderClient for Service {
    async fn authenticate(
        &self,
        identity: &Identity,
        options: AuthOptions,
    ) -> Result<TokenRecord, AuthError> {
        self.token_for(identity, options).await
    }

    async fn invalidate(&self, identity: &Identity) {
        self.forget(identity).await;
    }
}
