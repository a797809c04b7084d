use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;

/// A token is treated as stale this many seconds before it actually expires.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// Access token issued to one identity.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub access_token: SecretString,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: Option<SecretString>,
}

impl TokenRecord {
    /// Build a record from a provider lifetime in seconds.
    ///
    /// A missing or non-positive lifetime yields a record that expires at
    /// its issue time.
    #[must_use]
    pub fn with_lifetime(
        access_token: SecretString,
        refresh_token: Option<SecretString>,
        issued_at: DateTime<Utc>,
        expires_in: Option<i64>,
    ) -> Self {
        let lifetime = expires_in
            .filter(|secs| *secs > 0)
            .and_then(TimeDelta::try_seconds)
            .unwrap_or_else(TimeDelta::zero);
        let expires_at = issued_at.checked_add_signed(lifetime).unwrap_or(issued_at);

        Self {
            access_token,
            issued_at,
            expires_at,
            refresh_token,
        }
    }

    /// `true` while `now + buffer < expires_at`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(EXPIRY_BUFFER_SECS) < self.expires_at
    }

    /// Seconds left before the buffered expiry, zero when already stale.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now - TimeDelta::seconds(EXPIRY_BUFFER_SECS))
            .num_seconds()
            .max(0)
    }
}

/// Per-call options for [`crate::TokenProviderClient::authenticate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthOptions {
    /// Serve from and store into the token cache.
    pub use_cache: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self { use_cache: true }
    }
}

impl AuthOptions {
    #[must_use]
    pub fn no_cache() -> Self {
        Self { use_cache: false }
    }
}
