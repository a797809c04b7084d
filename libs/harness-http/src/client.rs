use reqwest::Client;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::HttpError;

/// Build a `reqwest` client honoring the configured timeouts and TLS mode.
///
/// # Errors
///
/// Returns [`HttpError::ClientBuild`] when the TLS backend cannot be
/// initialized.
pub fn build_client(cfg: &HttpClientConfig) -> Result<Client, HttpError> {
    if cfg.insecure_tls {
        tracing::warn!("TLS certificate verification is disabled");
    }

    let client = Client::builder()
        .timeout(cfg.timeout())
        .connect_timeout(cfg.connect_timeout())
        .danger_accept_invalid_certs(cfg.insecure_tls)
        .user_agent(cfg.user_agent.clone())
        .build()?;
    Ok(client)
}

/// Append path segments to `base`, percent-encoding each one.
///
/// Segments may contain `/` (model ids such as `openai/gpt-4o-mini`); they
/// are encoded rather than split.
///
/// # Errors
///
/// Returns [`HttpError::InvalidUrl`] when `base` cannot carry a path
/// (e.g. `mailto:` URLs).
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, HttpError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| HttpError::InvalidUrl {
            url: base.to_string(),
            reason: "URL cannot be a base".to_owned(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments() {
        let base = Url::parse("http://localhost:8321").unwrap();
        let url = endpoint(&base, &["v1", "models"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8321/v1/models");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let base = Url::parse("https://gateway.example.com/llama/").unwrap();
        let url = endpoint(&base, &["v1", "files", "file-1"]).unwrap();
        assert_eq!(url.as_str(), "https://gateway.example.com/llama/v1/files/file-1");
    }

    #[test]
    fn endpoint_encodes_slashes_in_ids() {
        let base = Url::parse("http://localhost:8321").unwrap();
        let url = endpoint(&base, &["v1", "models", "openai/gpt-4o-mini"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8321/v1/models/openai%2Fgpt-4o-mini"
        );
    }

    #[test]
    fn endpoint_rejects_cannot_be_base() {
        let base = Url::parse("mailto:ops@example.com").unwrap();
        assert!(matches!(
            endpoint(&base, &["v1"]),
            Err(HttpError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn insecure_client_builds() {
        let cfg = HttpClientConfig {
            insecure_tls: true,
            ..HttpClientConfig::default()
        };
        assert!(build_client(&cfg).is_ok());
    }
}
