//! Rows of the SQL store exposed by the API.

use std::sync::Arc;

use async_trait::async_trait;
use harness_security::SecurityContext;
use policy_model_sdk::{Operation, ResourceKind};
use reqwest::Method;
use serde_json::json;

use crate::api_client::{ApiClient, RequestBody};
use crate::outcome::Outcome;
use crate::probe::{ProbeRequest, ResourceProbe, unsupported};

pub struct SqlRecordProbe {
    api: Arc<ApiClient>,
}

impl SqlRecordProbe {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceProbe for SqlRecordProbe {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SqlRecord
    }

    async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome {
        match request.operation {
            Operation::Read => {
                self.api
                    .send(ctx, Method::GET, &["sql", "records"], &RequestBody::Empty)
                    .await
            }
            Operation::Create => {
                let body = request.payload.clone().unwrap_or_else(|| {
                    RequestBody::Json(json!({
                        "table": "authz_probe",
                        "values": {"written_by": ctx.display_name()},
                    }))
                });
                self.api
                    .send(ctx, Method::POST, &["sql", "records"], &body)
                    .await
            }
            Operation::Update | Operation::Delete => unsupported(request),
        }
    }
}
