//! Probe lookup by resource kind.

use std::collections::HashMap;
use std::sync::Arc;

use harness_http::{HttpClientConfig, RetryPolicy, build_client};
use harness_security::SecurityContext;
use policy_model_sdk::ResourceKind;
use url::Url;

use crate::adapters::{
    DatasetProbe, FileProbe, McpProbe, ModelProbe, SqlRecordProbe, ToolGroupProbe,
    VectorStoreFileProbe, VectorStoreProbe,
};
use crate::api_client::ApiClient;
use crate::config::ResourceProbeConfig;
use crate::error::ProbeError;
use crate::outcome::Outcome;
use crate::probe::{ProbeRequest, ResourceProbe};

#[derive(Default, Clone)]
pub struct ProbeRegistry {
    probes: HashMap<ResourceKind, Arc<dyn ResourceProbe>>,
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&ResourceKind> = self.probes.keys().collect();
        kinds.sort();
        f.debug_struct("ProbeRegistry")
            .field("probes", &kinds)
            .finish()
    }
}

impl ProbeRegistry {
    /// Build the HTTP client from `http` and register every LlamaStack probe.
    ///
    /// # Errors
    ///
    /// Returns an error when the API URL does not parse or the HTTP client
    /// cannot be built.
    pub fn from_config(
        cfg: &ResourceProbeConfig,
        http: &HttpClientConfig,
    ) -> Result<Self, ProbeError> {
        let base = Url::parse(&cfg.api_url).map_err(|e| ProbeError::InvalidApiUrl {
            url: cfg.api_url.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ProbeError::InvalidApiUrl {
                url: cfg.api_url.clone(),
                reason: "not a base URL".to_owned(),
            });
        }
        let client = build_client(http)?;
        let api = Arc::new(ApiClient::new(client, base, RetryPolicy::from_config(http)));
        Ok(Self::llamastack(&api, cfg))
    }

    /// All probes, sharing one API client.
    #[must_use]
    pub fn llamastack(api: &Arc<ApiClient>, cfg: &ResourceProbeConfig) -> Self {
        let mut registry = Self::default();
        registry.register(Arc::new(ModelProbe::new(
            Arc::clone(api),
            &cfg.chat_prompt,
            cfg.chat_max_tokens,
        )));
        registry.register(Arc::new(FileProbe::new(Arc::clone(api))));
        registry.register(Arc::new(VectorStoreProbe::new(
            Arc::clone(api),
            &cfg.embedding_model,
            cfg.embedding_dimension,
        )));
        registry.register(Arc::new(VectorStoreFileProbe::new(Arc::clone(api))));
        registry.register(Arc::new(DatasetProbe::new(Arc::clone(api))));
        registry.register(Arc::new(ToolGroupProbe::new(
            Arc::clone(api),
            &cfg.mcp.server_url,
        )));
        registry.register(Arc::new(SqlRecordProbe::new(Arc::clone(api))));
        registry.register(Arc::new(McpProbe::new(Arc::clone(api), cfg.mcp.clone())));
        registry
    }

    /// Register `probe`, replacing any probe for the same kind.
    pub fn register(&mut self, probe: Arc<dyn ResourceProbe>) {
        self.probes.insert(probe.kind(), probe);
    }

    /// # Errors
    ///
    /// Returns [`ProbeError::Unregistered`] when no probe handles `kind`.
    pub fn get(&self, kind: ResourceKind) -> Result<&Arc<dyn ResourceProbe>, ProbeError> {
        self.probes.get(&kind).ok_or(ProbeError::Unregistered(kind))
    }

    /// Dispatch `request` to the probe for its resource kind.
    #[tracing::instrument(
        skip_all,
        fields(kind = %request.target.kind, op = %request.operation, user = %ctx.display_name())
    )]
    pub async fn perform(&self, ctx: &SecurityContext, request: &ProbeRequest) -> Outcome {
        match self.get(request.target.kind) {
            Ok(probe) => probe.perform(ctx, request).await,
            Err(e) => Outcome::transport(e.to_string()),
        }
    }
}
