//! Suite runner configuration.

use serde::Deserialize;

/// Models every identity tries to run inference with.
pub const DEFAULT_MODELS: [&str; 3] = [
    "vllm-inference/llama-3-2-3b",
    "openai/gpt-4o-mini",
    "openai/gpt-4o",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteRunnerConfig {
    /// Identity that creates the shared team fixtures.
    pub creator: String,

    /// Name of the shared vector store owned by the creator's team.
    pub vector_store_fixture: String,

    /// Id of the shared dataset owned by the creator's team.
    pub dataset_fixture: String,

    /// Models targeted by the `models` suite.
    pub models: Vec<String>,

    /// Concurrent (identity, suite) units. `1` runs everything in order.
    pub parallel: usize,

    /// Delete the fixtures once every suite has finished.
    pub cleanup_fixtures: bool,
}

impl Default for SuiteRunnerConfig {
    fn default() -> Self {
        Self {
            creator: "developer".to_owned(),
            vector_store_fixture: "vs_mlteam_team".to_owned(),
            dataset_fixture: "ds_mlteam_team".to_owned(),
            models: DEFAULT_MODELS.iter().map(|m| (*m).to_owned()).collect(),
            parallel: 1,
            cleanup_fixtures: false,
        }
    }
}
