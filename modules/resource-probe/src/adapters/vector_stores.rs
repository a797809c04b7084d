//! Vector stores. Item reads go through the (server-filtered) listing.

use std::sync::Arc;

use async_trait::async_trait;
use harness_security::SecurityContext;
use policy_model_sdk::{Operation, ResourceKind};
use reqwest::Method;
use serde_json::{Value, json};

use crate::api_client::{ApiClient, RequestBody};
use crate::outcome::Outcome;
use crate::probe::{ProbeRequest, ResourceProbe, unsupported};

pub struct VectorStoreProbe {
    api: Arc<ApiClient>,
    embedding_model: String,
    embedding_dimension: Option<u32>,
}

impl VectorStoreProbe {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, embedding_model: &str, embedding_dimension: Option<u32>) -> Self {
        Self {
            api,
            embedding_model: embedding_model.to_owned(),
            embedding_dimension,
        }
    }

    /// Creation body for a store called `name`.
    #[must_use]
    pub fn create_body(&self, name: &str) -> Value {
        let mut body = json!({
            "name": name,
            "embedding_model": self.embedding_model,
        });
        if let Some(dim) = self.embedding_dimension {
            body["embedding_dimension"] = json!(dim);
        }
        body
    }
}

#[async_trait]
impl ResourceProbe for VectorStoreProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::VectorStore
    }

    async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome {
        match (request.operation, request.name()) {
            (Operation::Create, name) => {
                let body = request.payload.clone().unwrap_or_else(|| {
                    let generated = format!("demo-test-store-{}", chrono::Utc::now().timestamp());
                    RequestBody::Json(self.create_body(name.unwrap_or(&generated)))
                });
                self.api.send(ctx, Method::POST, &["vector_stores"], &body).await
            }
            (Operation::Read, None) => {
                self.api
                    .send(ctx, Method::GET, &["vector_stores"], &RequestBody::Empty)
                    .await
            }
            (Operation::Read, Some(key)) => self.api.find(ctx, &["vector_stores"], key).await,
            (Operation::Update, Some(id)) => {
                let body = request.payload.clone().unwrap_or_else(|| {
                    RequestBody::Json(json!({"metadata": {"probed_by": ctx.display_name()}}))
                });
                self.api
                    .send(ctx, Method::POST, &["vector_stores", id], &body)
                    .await
            }
            (Operation::Delete, Some(id)) => {
                self.api
                    .send(ctx, Method::DELETE, &["vector_stores", id], &RequestBody::Empty)
                    .await
            }
            _ => unsupported(request),
        }
    }
}
