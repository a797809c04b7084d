//! Tool groups.

use std::sync::Arc;

use async_trait::async_trait;
use harness_security::SecurityContext;
use policy_model_sdk::{Operation, ResourceKind};
use reqwest::Method;
use serde_json::json;

use crate::api_client::{ApiClient, RequestBody};
use crate::outcome::Outcome;
use crate::probe::{ProbeRequest, ResourceProbe, unsupported};

pub struct ToolGroupProbe {
    api: Arc<ApiClient>,
    mcp_url: String,
}

impl ToolGroupProbe {
    /// `mcp_url` is the endpoint registered for tool groups created without
    /// a payload.
    #[must_use]
    pub fn new(api: Arc<ApiClient>, mcp_url: &str) -> Self {
        Self {
            api,
            mcp_url: mcp_url.to_owned(),
        }
    }
}

#[async_trait]
impl ResourceProbe for ToolGroupProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ToolGroup
    }

    async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome {
        match (request.operation, request.name()) {
            (Operation::Read, None) => {
                self.api
                    .send(ctx, Method::GET, &["toolgroups"], &RequestBody::Empty)
                    .await
            }
            (Operation::Read, Some(id)) => self.api.find(ctx, &["toolgroups"], id).await,
            (Operation::Create, Some(id)) => {
                let body = request.payload.clone().unwrap_or_else(|| {
                    RequestBody::Json(json!({
                        "toolgroup_id": id,
                        "provider_id": "model-context-protocol",
                        "mcp_endpoint": {"uri": self.mcp_url},
                    }))
                });
                self.api.send(ctx, Method::POST, &["toolgroups"], &body).await
            }
            (Operation::Delete, Some(id)) => {
                self.api
                    .send(ctx, Method::DELETE, &["toolgroups", id], &RequestBody::Empty)
                    .await
            }
            _ => unsupported(request),
        }
    }
}
