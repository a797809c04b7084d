//! HTTP client configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings applied to every outbound client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpClientConfig {
    /// Whole-request timeout.
    pub timeout_secs: u64,

    /// TCP/TLS connect timeout.
    pub connect_timeout_secs: u64,

    /// Accept invalid TLS certificates (self-signed demo deployments).
    pub insecure_tls: bool,

    /// Retries after the first attempt for transient faults.
    pub max_retries: u32,

    /// Delay before the first retry; doubled on each subsequent one.
    pub initial_backoff_ms: u64,

    /// Upper bound for a single backoff delay.
    pub max_backoff_ms: u64,

    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            insecure_tls: false,
            max_retries: 2,
            initial_backoff_ms: 250,
            max_backoff_ms: 4_000,
            user_agent: concat!("authz-harness/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl HttpClientConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_budget() {
        let cfg = HttpClientConfig::default();
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.max_retries, 2);
        assert!(!cfg.insecure_tls);
        assert!(cfg.user_agent.starts_with("authz-harness/"));
    }
}
