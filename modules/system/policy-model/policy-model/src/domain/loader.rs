//! Rule table loading.

use std::path::Path;

use figment::Figment;
use figment::providers::{Format, Yaml};
use policy_model_sdk::{PolicyError, PolicyTable};

/// Built-in table for the demo deployment.
pub const DEFAULT_POLICY_YAML: &str = include_str!("../../policies/default_policy.yaml");

/// Parse a YAML rule table. `source_name` is only used in error messages.
///
/// # Errors
///
/// Returns [`PolicyError::Parse`] when the text is not a valid table.
pub fn parse_table(yaml: &str, source_name: &str) -> Result<PolicyTable, PolicyError> {
    Figment::from(Yaml::string(yaml))
        .extract::<PolicyTable>()
        .map_err(|e| PolicyError::Parse {
            source_name: source_name.to_owned(),
            reason: e.to_string(),
        })
}

/// Read and parse a YAML rule table from disk.
///
/// # Errors
///
/// Returns [`PolicyError::Parse`] when the file cannot be read or parsed.
pub fn load_table(path: &Path) -> Result<PolicyTable, PolicyError> {
    let source_name = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| PolicyError::Parse {
        source_name: source_name.clone(),
        reason: e.to_string(),
    })?;
    parse_table(&text, &source_name)
}
