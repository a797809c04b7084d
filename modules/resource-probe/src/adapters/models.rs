//! Models: listing and inference access.

use std::sync::Arc;

use async_trait::async_trait;
use harness_security::SecurityContext;
use policy_model_sdk::{Operation, ResourceKind};
use reqwest::Method;
use serde_json::json;

use crate::api_client::{ApiClient, RequestBody};
use crate::outcome::Outcome;
use crate::probe::{ProbeRequest, ResourceProbe, unsupported};

/// Reading a model item means running a chat completion with it.
pub struct ModelProbe {
    api: Arc<ApiClient>,
    prompt: String,
    max_tokens: u32,
}

impl ModelProbe {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, prompt: &str, max_tokens: u32) -> Self {
        Self {
            api,
            prompt: prompt.to_owned(),
            max_tokens,
        }
    }
}

#[async_trait]
impl ResourceProbe for ModelProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Model
    }

    async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome {
        match (request.operation, request.name()) {
            (Operation::Read, None) => {
                self.api
                    .send(ctx, Method::GET, &["models"], &RequestBody::Empty)
                    .await
            }
            (Operation::Read, Some(model)) => {
                let body = RequestBody::Json(json!({
                    "model": model,
                    "messages": [{"role": "user", "content": self.prompt}],
                    "max_tokens": self.max_tokens,
                }));
                self.api
                    .send(ctx, Method::POST, &["chat", "completions"], &body)
                    .await
            }
            _ => unsupported(request),
        }
    }
}
