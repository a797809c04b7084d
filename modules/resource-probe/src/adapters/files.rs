//! Files: upload, list, read, delete.

use std::sync::Arc;

use async_trait::async_trait;
use harness_security::SecurityContext;
use policy_model_sdk::{Operation, ResourceKind};
use reqwest::Method;

use crate::api_client::{ApiClient, RequestBody, Upload};
use crate::outcome::Outcome;
use crate::probe::{ProbeRequest, ResourceProbe, unsupported};

pub struct FileProbe {
    api: Arc<ApiClient>,
}

impl FileProbe {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Small text file used when a create request carries no payload.
    #[must_use]
    pub fn default_upload() -> Upload {
        Upload {
            file_name: "test-rbac.txt".to_owned(),
            content: format!("RBAC test - {}", chrono::Utc::now().timestamp()).into_bytes(),
            purpose: "assistants".to_owned(),
        }
    }
}

#[async_trait]
impl ResourceProbe for FileProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::File
    }

    async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome {
        match (request.operation, request.name()) {
            (Operation::Create, _) => {
                let body = request
                    .payload
                    .clone()
                    .unwrap_or_else(|| RequestBody::Upload(Self::default_upload()));
                self.api.send(ctx, Method::POST, &["files"], &body).await
            }
            (Operation::Read, None) => {
                self.api
                    .send(ctx, Method::GET, &["files"], &RequestBody::Empty)
                    .await
            }
            (Operation::Read, Some(id)) => {
                self.api
                    .send(ctx, Method::GET, &["files", id], &RequestBody::Empty)
                    .await
            }
            (Operation::Delete, Some(id)) => {
                self.api
                    .send(ctx, Method::DELETE, &["files", id], &RequestBody::Empty)
                    .await
            }
            _ => unsupported(request),
        }
    }
}
