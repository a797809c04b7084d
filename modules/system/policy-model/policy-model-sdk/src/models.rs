//! Evaluation inputs and outputs.

use std::collections::BTreeSet;
use std::fmt;

use harness_security::{Identity, SecurityContext};
use serde::{Deserialize, Serialize};

/// Operation attempted on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Self; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of resources exposed by the API under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Model,
    File,
    VectorStore,
    VectorStoreFile,
    Dataset,
    ToolGroup,
    SqlRecord,
    McpServer,
}

impl ResourceKind {
    pub const ALL: [Self; 8] = [
        Self::Model,
        Self::File,
        Self::VectorStore,
        Self::VectorStoreFile,
        Self::Dataset,
        Self::ToolGroup,
        Self::SqlRecord,
        Self::McpServer,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::File => "file",
            Self::VectorStore => "vector_store",
            Self::VectorStoreFile => "vector_store_file",
            Self::Dataset => "dataset",
            Self::ToolGroup => "tool_group",
            Self::SqlRecord => "sql_record",
            Self::McpServer => "mcp_server",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner attributes stamped on a resource at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub teams: BTreeSet<String>,
}

impl Owner {
    /// Owner attributes a resource receives when `identity` creates it.
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            owner_id: Some(identity.username().to_owned()),
            teams: identity.teams().clone(),
        }
    }
}

/// What a case targets: a whole collection (`name == None`) or one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
}

impl ResourceDescriptor {
    #[must_use]
    pub fn collection(kind: ResourceKind) -> Self {
        Self {
            kind,
            name: None,
            owner: None,
        }
    }

    #[must_use]
    pub fn item(kind: ResourceKind, name: &str) -> Self {
        Self {
            kind,
            name: Some(name.to_owned()),
            owner: None,
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.name.is_none()
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}:{name}", self.kind),
            None => write!(f, "{}:*", self.kind),
        }
    }
}

/// Attributes a decision is computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    /// `None` for callers without a token.
    pub username: Option<String>,
    pub roles: BTreeSet<String>,
    pub teams: BTreeSet<String>,
}

impl Subject {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl From<&Identity> for Subject {
    fn from(identity: &Identity) -> Self {
        Self {
            username: Some(identity.username().to_owned()),
            roles: identity.roles().clone(),
            teams: identity.teams().clone(),
        }
    }
}

impl From<&SecurityContext> for Subject {
    fn from(ctx: &SecurityContext) -> Self {
        if ctx.is_anonymous() {
            return Self::anonymous();
        }
        Self {
            username: ctx.username().map(str::to_owned),
            roles: ctx.roles().clone(),
            teams: ctx.teams().clone(),
        }
    }
}

/// Expected or observed access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Denied,
}

impl Decision {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
        })
    }
}

/// A decision together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub decision: Decision,
    pub reason: String,
}

impl Evaluation {
    #[must_use]
    pub fn allowed(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Allowed,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Denied,
            reason: reason.into(),
        }
    }
}
