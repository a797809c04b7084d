//! Configuration for the policy model.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyModelConfig {
    /// Rule table to load instead of the built-in one.
    pub file: Option<PathBuf>,
}
