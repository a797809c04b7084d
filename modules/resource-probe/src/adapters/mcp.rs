//! External tool server access, exercised through the responses API.

use std::sync::Arc;

use async_trait::async_trait;
use harness_security::SecurityContext;
use policy_model_sdk::{Operation, ResourceKind};
use reqwest::Method;
use serde_json::{Value, json};

use crate::api_client::{ApiClient, RequestBody};
use crate::config::McpProbeConfig;
use crate::outcome::Outcome;
use crate::probe::{ProbeRequest, ResourceProbe, unsupported};

pub struct McpProbe {
    api: Arc<ApiClient>,
    cfg: McpProbeConfig,
}

impl McpProbe {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, cfg: McpProbeConfig) -> Self {
        Self { api, cfg }
    }

    /// A response request that requires one call to the configured server.
    #[must_use]
    pub fn response_body(&self) -> Value {
        json!({
            "model": self.cfg.model,
            "input": self.cfg.input,
            "tools": [{
                "type": "mcp",
                "server_label": self.cfg.server_label,
                "server_description": self.cfg.server_description,
                "server_url": self.cfg.server_url,
                "require_approval": "never",
            }],
            "stream": false,
        })
    }
}

#[async_trait]
impl ResourceProbe for McpProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::McpServer
    }

    async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome {
        if request.operation != Operation::Read {
            return unsupported(request);
        }
        let body = request
            .payload
            .clone()
            .unwrap_or_else(|| RequestBody::Json(self.response_body()));
        self.api.send(ctx, Method::POST, &["responses"], &body).await
    }
}
