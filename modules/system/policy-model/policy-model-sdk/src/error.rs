//! Error types for the policy model.

use thiserror::Error;

use crate::models::ResourceKind;

/// Rule table defects. Raised when a table is loaded, never during
/// evaluation.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy table has no entry for resource kind '{0}'")]
    MissingResourceKind(ResourceKind),

    #[error("policy table lists resource kind '{0}' more than once")]
    DuplicateResourceKind(ResourceKind),

    #[error("unsupported policy table version {0}")]
    UnsupportedVersion(u32),

    #[error("rule {index} for '{kind}' is invalid: {reason}")]
    InvalidRule {
        kind: ResourceKind,
        index: usize,
        reason: String,
    },

    #[error("policy table '{source_name}' could not be parsed: {reason}")]
    Parse { source_name: String, reason: String },
}
