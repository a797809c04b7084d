//! Probe configuration.

use serde::Deserialize;

pub const FREE_MODEL: &str = "vllm-inference/llama-3-2-3b";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceProbeConfig {
    /// LlamaStack base URL; probes append `/v1/...`.
    pub api_url: String,

    /// Embedding model for vector stores created by probes and fixtures.
    pub embedding_model: String,

    /// Sent with vector store creation when set.
    pub embedding_dimension: Option<u32>,

    /// Prompt used for model access checks.
    pub chat_prompt: String,

    pub chat_max_tokens: u32,

    pub mcp: McpProbeConfig,
}

impl Default for ResourceProbeConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8321".to_owned(),
            embedding_model: "sentence-transformers/ibm-granite/granite-embedding-125m-english"
                .to_owned(),
            embedding_dimension: None,
            chat_prompt: "Say Hi!!!".to_owned(),
            chat_max_tokens: 10,
            mcp: McpProbeConfig::default(),
        }
    }
}

/// External tool integration reached through the responses API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct McpProbeConfig {
    pub server_label: String,
    pub server_url: String,
    pub server_description: String,
    /// Model that drives the tool call.
    pub model: String,
    pub input: String,
}

impl Default for McpProbeConfig {
    fn default() -> Self {
        Self {
            server_label: "deepwiki".to_owned(),
            server_url: "https://mcp.deepwiki.com/mcp".to_owned(),
            server_description: "DeepWiki MCP server for wiki queries".to_owned(),
            model: FREE_MODEL.to_owned(),
            input: "What version of python is used in the llamastack/llama-stack project? \
                    Be brief. Use the deepwiki ask_question tool to answer."
                .to_owned(),
        }
    }
}
