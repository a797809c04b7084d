//! Configuration for the token provider.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;

pub const DEFAULT_REALM: &str = "llamastack-demo";
pub const DEFAULT_CLIENT_ID: &str = "llamastack";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenProviderConfig {
    /// Identity provider base URL (without `/realms/...`).
    pub idp_url: String,

    pub realm: String,

    pub client_id: String,

    /// Confidential client secret. Omitted from the grant when unset.
    pub client_secret: Option<SecretString>,

    /// Token cache directory. `None` selects the user cache directory.
    pub cache_dir: Option<PathBuf>,
}

impl Default for TokenProviderConfig {
    fn default() -> Self {
        Self {
            idp_url: "https://kc-keycloak.com".to_owned(),
            realm: DEFAULT_REALM.to_owned(),
            client_id: DEFAULT_CLIENT_ID.to_owned(),
            client_secret: None,
            cache_dir: None,
        }
    }
}

impl TokenProviderConfig {
    /// Configured cache directory, or `<user cache dir>/llamastack-demo`.
    #[must_use]
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("llamastack-demo")
        })
    }
}
