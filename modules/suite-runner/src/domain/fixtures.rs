//! Run-scoped shared resources.
//!
//! The designated creator establishes a team-owned vector store and dataset
//! before any suite runs. Every dependent step receives them through
//! [`RunFixtures`]; nothing else refers to them.

use harness_security::{Identity, SecurityContext};
use policy_model_sdk::{Operation, Owner, ResourceDescriptor, ResourceKind};
use resource_probe::{Outcome, ProbeRegistry, ProbeRequest};
use serde::Serialize;

use crate::config::SuiteRunnerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureKind {
    VectorStore,
    Dataset,
}

impl FixtureKind {
    #[must_use]
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            Self::VectorStore => ResourceKind::VectorStore,
            Self::Dataset => ResourceKind::Dataset,
        }
    }
}

/// A fixture that exists on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureHandle {
    pub kind: FixtureKind,
    /// Server id, used for item operations.
    pub id: String,
    /// Name the fixture is looked up by.
    pub name: String,
    pub owner: Owner,
    /// Found from an earlier run rather than created by this one.
    pub reused: bool,
}

impl FixtureHandle {
    /// Key a step addresses the fixture by: the name for list lookups, the
    /// id for direct item routes.
    #[must_use]
    pub fn key(&self) -> &str {
        match self.kind {
            FixtureKind::VectorStore => &self.name,
            FixtureKind::Dataset => &self.id,
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::item(self.kind.resource_kind(), self.key()).with_owner(self.owner.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FixtureState {
    NotRequested,
    Ready(FixtureHandle),
    Unavailable { reason: String },
}

/// Fixture handles for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunFixtures {
    pub vector_store: FixtureState,
    pub dataset: FixtureState,
}

impl Default for RunFixtures {
    fn default() -> Self {
        Self {
            vector_store: FixtureState::NotRequested,
            dataset: FixtureState::NotRequested,
        }
    }
}

impl RunFixtures {
    /// Every fixture unavailable for the same reason.
    #[must_use]
    pub fn unavailable(reason: &str) -> Self {
        Self {
            vector_store: FixtureState::Unavailable {
                reason: reason.to_owned(),
            },
            dataset: FixtureState::Unavailable {
                reason: reason.to_owned(),
            },
        }
    }

    #[must_use]
    pub fn state(&self, kind: FixtureKind) -> &FixtureState {
        match kind {
            FixtureKind::VectorStore => &self.vector_store,
            FixtureKind::Dataset => &self.dataset,
        }
    }

    /// The ready fixture, or why a dependent step must be skipped.
    ///
    /// # Errors
    ///
    /// Returns the skip reason when the fixture was not established.
    pub fn get(&self, kind: FixtureKind) -> Result<&FixtureHandle, String> {
        match self.state(kind) {
            FixtureState::Ready(handle) => Ok(handle),
            FixtureState::Unavailable { reason } => {
                Err(format!("fixture dependency failed: {reason}"))
            }
            FixtureState::NotRequested => Err("fixture was not requested".to_owned()),
        }
    }

    fn ready(&self) -> impl Iterator<Item = &FixtureHandle> {
        [&self.vector_store, &self.dataset]
            .into_iter()
            .filter_map(|state| match state {
                FixtureState::Ready(handle) => Some(handle),
                _ => None,
            })
    }
}

/// Find or create the team fixtures as `creator`.
#[tracing::instrument(skip_all, fields(creator = %creator.username()))]
pub async fn establish(
    probes: &ProbeRegistry,
    ctx: &SecurityContext,
    creator: &Identity,
    cfg: &SuiteRunnerConfig,
) -> RunFixtures {
    let owner = Owner::from_identity(creator);
    let vector_store = find_or_create(
        probes,
        ctx,
        FixtureKind::VectorStore,
        &cfg.vector_store_fixture,
        &owner,
    )
    .await;
    let dataset = find_or_create(
        probes,
        ctx,
        FixtureKind::Dataset,
        &cfg.dataset_fixture,
        &owner,
    )
    .await;
    RunFixtures {
        vector_store,
        dataset,
    }
}

async fn find_or_create(
    probes: &ProbeRegistry,
    ctx: &SecurityContext,
    kind: FixtureKind,
    name: &str,
    owner: &Owner,
) -> FixtureState {
    let target = ResourceDescriptor::item(kind.resource_kind(), name);

    let lookup = probes
        .perform(ctx, &ProbeRequest::new(Operation::Read, target.clone()))
        .await;
    let (outcome, reused) = match lookup {
        Outcome::Success { .. } => (lookup, true),
        Outcome::NotFound => {
            let created = probes
                .perform(ctx, &ProbeRequest::new(Operation::Create, target))
                .await;
            (created, false)
        }
        other => {
            return unavailable(kind, name, &format!("lookup failed: {}", other.summary()));
        }
    };

    if !outcome.is_success() {
        return unavailable(kind, name, &format!("creation failed: {}", outcome.summary()));
    }

    let id = outcome.resource_id().unwrap_or_else(|| name.to_owned());
    tracing::info!(fixture = name, %id, reused, "fixture ready");
    FixtureState::Ready(FixtureHandle {
        kind,
        id,
        name: name.to_owned(),
        owner: owner.clone(),
        reused,
    })
}

fn unavailable(kind: FixtureKind, name: &str, reason: &str) -> FixtureState {
    tracing::warn!(fixture = name, kind = %kind.resource_kind(), reason, "fixture unavailable");
    FixtureState::Unavailable {
        reason: format!("{name}: {reason}"),
    }
}

/// Delete every ready fixture. Failures are logged and otherwise ignored.
#[tracing::instrument(skip_all)]
pub async fn cleanup(probes: &ProbeRegistry, ctx: &SecurityContext, fixtures: &RunFixtures) {
    for handle in fixtures.ready() {
        let target = ResourceDescriptor::item(handle.kind.resource_kind(), &handle.id);
        let outcome = probes
            .perform(ctx, &ProbeRequest::new(Operation::Delete, target))
            .await;
        if outcome.is_success() {
            tracing::info!(fixture = %handle.name, "fixture deleted");
        } else {
            tracing::warn!(fixture = %handle.name, outcome = %outcome.summary(), "fixture cleanup failed");
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn handle(kind: FixtureKind) -> FixtureHandle {
        FixtureHandle {
            kind,
            id: "vs_123".to_owned(),
            name: "vs_mlteam_team".to_owned(),
            owner: Owner::default(),
            reused: false,
        }
    }

    #[test]
    fn vector_store_is_addressed_by_name_dataset_by_id() {
        assert_eq!(handle(FixtureKind::VectorStore).key(), "vs_mlteam_team");
        assert_eq!(handle(FixtureKind::Dataset).key(), "vs_123");
    }

    #[test]
    fn unavailable_fixture_yields_skip_reason() {
        let fixtures = RunFixtures::unavailable("creator 'developer' could not authenticate");
        let reason = fixtures.get(FixtureKind::Dataset).unwrap_err();
        assert!(reason.starts_with("fixture dependency failed"));
        assert!(reason.contains("developer"));
    }

    #[test]
    fn default_fixtures_are_not_requested() {
        let fixtures = RunFixtures::default();
        assert_eq!(fixtures.ready().count(), 0);
        assert!(fixtures.get(FixtureKind::VectorStore).is_err());
    }
}
