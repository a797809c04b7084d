//! Files attached to a vector store. Requests carry the store id as parent.

use std::sync::Arc;

use async_trait::async_trait;
use harness_security::SecurityContext;
use policy_model_sdk::{Operation, ResourceKind};
use reqwest::Method;
use serde_json::json;

use crate::api_client::{ApiClient, RequestBody};
use crate::outcome::Outcome;
use crate::probe::{ProbeRequest, ResourceProbe, unsupported};

pub struct VectorStoreFileProbe {
    api: Arc<ApiClient>,
}

impl VectorStoreFileProbe {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceProbe for VectorStoreFileProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::VectorStoreFile
    }

    async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome {
        let Some(store) = request.parent.as_deref() else {
            return Outcome::transport("vector store file request without a vector store");
        };

        match (request.operation, request.name()) {
            (Operation::Create, Some(file_id)) => {
                let body = request
                    .payload
                    .clone()
                    .unwrap_or_else(|| RequestBody::Json(json!({"file_id": file_id})));
                self.api
                    .send(ctx, Method::POST, &["vector_stores", store, "files"], &body)
                    .await
            }
            (Operation::Read, None) => {
                self.api
                    .send(
                        ctx,
                        Method::GET,
                        &["vector_stores", store, "files"],
                        &RequestBody::Empty,
                    )
                    .await
            }
            (Operation::Read, Some(file_id)) => {
                self.api
                    .find(ctx, &["vector_stores", store, "files"], file_id)
                    .await
            }
            (Operation::Delete, Some(file_id)) => {
                self.api
                    .send(
                        ctx,
                        Method::DELETE,
                        &["vector_stores", store, "files", file_id],
                        &RequestBody::Empty,
                    )
                    .await
            }
            _ => unsupported(request),
        }
    }
}
