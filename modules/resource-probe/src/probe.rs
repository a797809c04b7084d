//! Probe trait and request model.

use async_trait::async_trait;
use harness_security::SecurityContext;
use policy_model_sdk::{Operation, ResourceDescriptor, ResourceKind};

use crate::api_client::RequestBody;
use crate::outcome::Outcome;

/// One operation to perform against the API.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub operation: Operation,
    pub target: ResourceDescriptor,
    /// Enclosing resource id (the vector store of a vector store file).
    pub parent: Option<String>,
    /// Creation or update payload. Adapters supply a default when `None`.
    pub payload: Option<RequestBody>,
    /// Read dataset rows instead of the dataset record.
    pub rows: bool,
}

impl ProbeRequest {
    #[must_use]
    pub fn new(operation: Operation, target: ResourceDescriptor) -> Self {
        Self {
            operation,
            target,
            parent: None,
            payload: None,
            rows: false,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_owned());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: RequestBody) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn rows(mut self) -> Self {
        self.rows = true;
        self
    }

    /// Item name or id, `None` for collection targets.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.target.name.as_deref()
    }
}

/// Exercises one resource kind.
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Perform the request as `ctx`. Never fails: every problem is an
    /// [`Outcome`].
    async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome;
}

/// Outcome for requests an adapter has no endpoint for.
#[must_use]
pub fn unsupported(request: &ProbeRequest) -> Outcome {
    Outcome::transport(format!(
        "no endpoint for {} on {}",
        request.operation, request.target
    ))
}
