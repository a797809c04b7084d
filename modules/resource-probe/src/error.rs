use harness_http::HttpError;
use policy_model_sdk::ResourceKind;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("no probe registered for {0}")]
    Unregistered(ResourceKind),
}
