//! Declarative rule table.
//!
//! ```yaml
//! version: 1
//! admin_role: admin
//! resources:
//!   - kind: model
//!     rules:
//!       - id: model-list
//!         actions: [read]
//!         scope: collection
//!         authenticated: true
//!   - kind: vector_store
//!     ownership: team
//!     rules:
//!       - actions: [create]
//!         roles: [developer]
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{Operation, ResourceKind};

/// Table format understood by this crate.
pub const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyTable {
    pub version: u32,
    /// Role that is allowed everything.
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
    pub resources: Vec<ResourcePolicy>,
}

fn default_admin_role() -> String {
    harness_security::constants::ADMIN_ROLE.to_owned()
}

impl PolicyTable {
    #[must_use]
    pub fn resource(&self, kind: ResourceKind) -> Option<&ResourcePolicy> {
        self.resources.iter().find(|r| r.kind == kind)
    }
}

/// How items of a kind relate to their creators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    /// Access is decided by role rules alone.
    #[default]
    None,
    /// Item access is decided by team membership of the owner.
    Team,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcePolicy {
    pub kind: ResourceKind,
    #[serde(default)]
    pub ownership: Ownership,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// Which targets a rule covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Collection,
    Item,
    #[default]
    Any,
}

/// One grant. A rule matches when the operation is listed, the target fits
/// `scope` and `names`, and the subject satisfies the grant: authenticated
/// (when `authenticated`) or holding one of `roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyRule {
    /// Label used in decision reasons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub actions: Vec<Operation>,
    #[serde(default)]
    pub scope: Scope,
    /// Item names the rule is limited to. Empty means every item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}
