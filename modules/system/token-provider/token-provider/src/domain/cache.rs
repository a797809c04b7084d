//! On-disk token cache.
//!
//! One JSON file per identity, named `token_<username>_<key>.json` where
//! `<key>` is derived from the identity provider URL and realm. Records that
//! cannot be read back are deleted and reported as a miss.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use token_provider_sdk::TokenRecord;

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("token cache I/O on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("token cache encoding: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// File layout of a cached token.
#[derive(Serialize, Deserialize)]
struct StoredToken {
    username: String,
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn from_record(username: &str, record: &TokenRecord) -> Self {
        Self {
            username: username.to_owned(),
            access_token: record.access_token.expose_secret().to_owned(),
            refresh_token: record
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            issued_at: record.issued_at,
            expires_at: record.expires_at,
        }
    }

    fn into_record(self) -> TokenRecord {
        TokenRecord {
            access_token: SecretString::from(self.access_token),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            refresh_token: self.refresh_token.map(SecretString::from),
        }
    }
}

/// Per-identity token files under one directory, scoped to one provider.
#[derive(Debug, Clone)]
pub struct TokenCache {
    dir: PathBuf,
    key: String,
}

impl TokenCache {
    #[must_use]
    pub fn new(dir: PathBuf, idp_url: &str, realm: &str) -> Self {
        Self {
            dir,
            key: provider_key(idp_url, realm),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the directory cannot be created.
    pub fn ensure_dir(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))
    }

    #[must_use]
    pub fn path_for(&self, username: &str) -> PathBuf {
        self.dir
            .join(format!("token_{}_{}.json", file_safe(username), self.key))
    }

    #[must_use]
    pub fn get(&self, username: &str) -> Option<TokenRecord> {
        self.get_at(username, Utc::now())
    }

    /// Cached record for `username` if it is still valid at `now`.
    #[must_use]
    pub fn get_at(&self, username: &str, now: DateTime<Utc>) -> Option<TokenRecord> {
        let path = self.path_for(username);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "token cache unreadable");
                return None;
            }
        };

        let stored: StoredToken = match serde_json::from_slice(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "removing corrupt token cache entry");
                self.remove_file(&path);
                return None;
            }
        };

        if stored.username != username {
            tracing::warn!(path = %path.display(), "token cache entry belongs to another user, removing");
            self.remove_file(&path);
            return None;
        }

        let record = stored.into_record();
        if record.is_valid_at(now) {
            Some(record)
        } else {
            tracing::debug!(username, "cached token expired");
            None
        }
    }

    /// Write `record` for `username`, replacing any previous entry atomically.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the directory or file cannot be written.
    pub fn put(&self, username: &str, record: &TokenRecord) -> Result<(), CacheError> {
        self.ensure_dir()?;
        let path = self.path_for(username);
        let body = serde_json::to_vec(&StoredToken::from_record(username, record))?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        restrict_permissions(tmp.path())?;
        tmp.write_all(&body)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| CacheError::io(&path, e.error))?;

        tracing::debug!(username, path = %path.display(), "token cached");
        Ok(())
    }

    /// Remove the entry for `username`. Missing entries are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when an existing file cannot be removed.
    pub fn invalidate(&self, username: &str) -> Result<(), CacheError> {
        let path = self.path_for(username);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    fn remove_file(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to remove token cache entry");
        }
    }
}

/// First 8 hex chars of `sha256("<idp_url>:<realm>")`.
#[must_use]
pub fn provider_key(idp_url: &str, realm: &str) -> String {
    let digest = Sha256::digest(format!("{idp_url}:{realm}").as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(8);
    key
}

fn file_safe(username: &str) -> String {
    username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), CacheError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| CacheError::io(path, e))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn restrict_permissions(_path: &Path) -> Result<(), CacheError> {
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use tempfile::TempDir;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn record(lifetime: i64) -> TokenRecord {
        TokenRecord::with_lifetime(
            SecretString::from("access-abc".to_owned()),
            Some(SecretString::from("refresh-xyz".to_owned())),
            t0(),
            Some(lifetime),
        )
    }

    fn cache(dir: &TempDir) -> TokenCache {
        TokenCache::new(dir.path().to_path_buf(), "https://kc.example.com", "llamastack-demo")
    }

    #[test]
    fn round_trip_within_validity() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        cache.put("developer", &record(300)).unwrap();

        let got = cache.get_at("developer", t0() + TimeDelta::seconds(10)).unwrap();
        assert_eq!(got.access_token.expose_secret(), "access-abc");
        assert_eq!(
            got.refresh_token.as_ref().map(ExposeSecret::expose_secret),
            Some("refresh-xyz")
        );
        assert_eq!(got.expires_at, t0() + TimeDelta::seconds(300));
    }

    #[test]
    fn entry_inside_buffer_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        cache.put("developer", &record(300)).unwrap();

        assert!(cache.get_at("developer", t0() + TimeDelta::seconds(240)).is_none());
        // Stale entries stay on disk; the next put overwrites them.
        assert!(cache.path_for("developer").exists());
    }

    #[test]
    fn corrupt_entry_is_removed() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let path = cache.path_for("user");
        std::fs::write(&path, b"{not json").unwrap();

        assert!(cache.get_at("user", t0()).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn invalidate_removes_entry_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        cache.put("admin", &record(300)).unwrap();

        cache.invalidate("admin").unwrap();
        assert!(cache.get_at("admin", t0()).is_none());
        cache.invalidate("admin").unwrap();
    }

    #[test]
    fn file_name_is_scoped_to_provider() {
        let dir = TempDir::new().unwrap();
        let a = TokenCache::new(dir.path().to_path_buf(), "https://a.example.com", "llamastack-demo");
        let b = TokenCache::new(dir.path().to_path_buf(), "https://b.example.com", "llamastack-demo");

        assert_ne!(a.path_for("developer"), b.path_for("developer"));

        a.put("developer", &record(300)).unwrap();
        assert!(b.get_at("developer", t0()).is_none());
    }

    #[test]
    fn file_name_format() {
        let key = provider_key("https://kc.example.com", "llamastack-demo");
        assert_eq!(key.len(), 8);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

        let dir = TempDir::new().unwrap();
        let name = cache(&dir)
            .path_for("dev/../x")
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert_eq!(name, format!("token_dev_.._x_{key}.json"));
    }

    #[cfg(unix)]
    #[test]
    fn entries_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        cache.put("developer", &record(300)).unwrap();

        let mode = std::fs::metadata(cache.path_for("developer"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn tokens_are_not_in_debug_output() {
        let got = record(300);
        assert!(!format!("{got:?}").contains("access-abc"));
    }
}
