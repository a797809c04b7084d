//! Datasets: registration, lookup, row iteration, removal.

use std::sync::Arc;

use async_trait::async_trait;
use harness_security::SecurityContext;
use policy_model_sdk::{Operation, ResourceKind};
use reqwest::Method;
use serde_json::{Value, json};

use crate::api_client::{ApiClient, RequestBody};
use crate::outcome::Outcome;
use crate::probe::{ProbeRequest, ResourceProbe, unsupported};

pub struct DatasetProbe {
    api: Arc<ApiClient>,
}

impl DatasetProbe {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Registration body for a small inline question/answer dataset.
    #[must_use]
    pub fn create_body(dataset_id: &str, created_by: &str) -> Value {
        json!({
            "dataset_id": dataset_id,
            "purpose": "eval/question-answer",
            "source": {
                "type": "rows",
                "rows": [
                    {"messages": [{"role": "user", "content": "What is RBAC?"}],
                     "answer": "Role based access control"}
                ]
            },
            "metadata": {"created_by": created_by},
        })
    }
}

#[async_trait]
impl ResourceProbe for DatasetProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Dataset
    }

    async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome {
        match (request.operation, request.name()) {
            (Operation::Create, name) => {
                let body = request.payload.clone().unwrap_or_else(|| {
                    let generated = format!("demo-test-dataset-{}", chrono::Utc::now().timestamp());
                    RequestBody::Json(Self::create_body(
                        name.unwrap_or(&generated),
                        ctx.display_name(),
                    ))
                });
                self.api.send(ctx, Method::POST, &["datasets"], &body).await
            }
            (Operation::Read, None) => {
                self.api
                    .send(ctx, Method::GET, &["datasets"], &RequestBody::Empty)
                    .await
            }
            (Operation::Read, Some(id)) if request.rows => {
                self.api
                    .send(
                        ctx,
                        Method::GET,
                        &["datasetio", "iterrows", id],
                        &RequestBody::Empty,
                    )
                    .await
            }
            (Operation::Read, Some(id)) => {
                self.api
                    .send(ctx, Method::GET, &["datasets", id], &RequestBody::Empty)
                    .await
            }
            (Operation::Delete, Some(id)) => {
                self.api
                    .send(ctx, Method::DELETE, &["datasets", id], &RequestBody::Empty)
                    .await
            }
            _ => unsupported(request),
        }
    }
}
