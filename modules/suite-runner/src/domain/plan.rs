//! Ordered steps of each suite.
//!
//! Steps are data. Targets that only exist at run time (an uploaded file,
//! the shared fixtures) are named symbolically and resolved by the runner
//! when the step executes.

use policy_model_sdk::{Decision, Operation, ResourceKind};

use crate::config::SuiteRunnerConfig;
use crate::domain::fixtures::FixtureKind;
use crate::domain::suite::Suite;

/// Run-time value produced by a create step and consumed by later steps of
/// the same (identity, suite) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    File,
    VectorStore,
    Dataset,
}

impl Slot {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::VectorStore => "vector store",
            Self::Dataset => "dataset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Collection,
    /// A resource whose name is known up front.
    Named(String),
    /// A fresh resource name, `<prefix>-<username>-<timestamp>`.
    Generated(&'static str),
    /// The id a previous step stored in this slot.
    Produced(Slot),
    /// A shared run fixture.
    Fixture(FixtureKind),
}

/// Where the expected decision comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// Ask the policy model.
    Derived,
    /// Hand-written cross-identity scenario.
    Fixed(Decision),
}

#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub kind: ResourceKind,
    pub operation: Operation,
    pub target: Target,
    /// Enclosing resource (vector store of a vector store file).
    pub parent: Option<Target>,
    pub expectation: Expectation,
    /// Store the created resource id in this slot on success.
    pub produces: Option<Slot>,
    /// Read dataset rows rather than the dataset record.
    pub rows: bool,
}

impl Step {
    fn new(name: &str, kind: ResourceKind, operation: Operation, target: Target) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            operation,
            target,
            parent: None,
            expectation: Expectation::Derived,
            produces: None,
            rows: false,
        }
    }

    fn list(name: &str, kind: ResourceKind) -> Self {
        Self::new(name, kind, Operation::Read, Target::Collection)
    }

    fn produces(mut self, slot: Slot) -> Self {
        self.produces = Some(slot);
        self
    }

    fn within(mut self, parent: Target) -> Self {
        self.parent = Some(parent);
        self
    }

    fn rows(mut self) -> Self {
        self.rows = true;
        self
    }

    /// Slots and fixtures this step depends on.
    #[must_use]
    pub fn prerequisites(&self) -> impl Iterator<Item = &Target> {
        std::iter::once(&self.target)
            .chain(self.parent.as_ref())
            .filter(|t| matches!(t, Target::Produced(_) | Target::Fixture(_)))
    }
}

/// The ordered steps `suite` runs for one identity.
#[must_use]
pub fn steps(suite: Suite, cfg: &SuiteRunnerConfig) -> Vec<Step> {
    match suite {
        Suite::Models => model_steps(cfg),
        Suite::Files => file_steps(),
        Suite::Vectors => vector_steps(),
        Suite::Datasets => dataset_steps(),
        Suite::Tools => vec![Step::list("list tool groups", ResourceKind::ToolGroup)],
        Suite::Mcp => vec![Step::list("respond with mcp tool", ResourceKind::McpServer)],
        Suite::Team => vec![
            Step::new(
                "see team vector store",
                ResourceKind::VectorStore,
                Operation::Read,
                Target::Fixture(FixtureKind::VectorStore),
            ),
            Step::new(
                "read team dataset",
                ResourceKind::Dataset,
                Operation::Read,
                Target::Fixture(FixtureKind::Dataset),
            ),
        ],
    }
}

fn model_steps(cfg: &SuiteRunnerConfig) -> Vec<Step> {
    std::iter::once(Step::list("list models", ResourceKind::Model))
        .chain(cfg.models.iter().map(|model| {
            Step::new(
                &format!("chat with {model}"),
                ResourceKind::Model,
                Operation::Read,
                Target::Named(model.clone()),
            )
        }))
        .collect()
}

fn file_steps() -> Vec<Step> {
    let file = Target::Produced(Slot::File);
    vec![
        Step::new(
            "upload file",
            ResourceKind::File,
            Operation::Create,
            Target::Collection,
        )
        .produces(Slot::File),
        Step::list("list files", ResourceKind::File),
        Step::new(
            "read uploaded file",
            ResourceKind::File,
            Operation::Read,
            file.clone(),
        ),
        Step::new(
            "delete uploaded file",
            ResourceKind::File,
            Operation::Delete,
            file,
        ),
    ]
}

fn vector_steps() -> Vec<Step> {
    let store = Target::Produced(Slot::VectorStore);
    let file = Target::Produced(Slot::File);
    vec![
        Step::new(
            "create vector store",
            ResourceKind::VectorStore,
            Operation::Create,
            Target::Generated("demo-test-store"),
        )
        .produces(Slot::VectorStore),
        Step::list("list vector stores", ResourceKind::VectorStore),
        Step::new(
            "update vector store",
            ResourceKind::VectorStore,
            Operation::Update,
            store.clone(),
        ),
        Step::new(
            "upload attachment",
            ResourceKind::File,
            Operation::Create,
            Target::Collection,
        )
        .produces(Slot::File),
        Step::new(
            "attach file to vector store",
            ResourceKind::VectorStoreFile,
            Operation::Create,
            file.clone(),
        )
        .within(store.clone()),
        Step::list("list vector store files", ResourceKind::VectorStoreFile)
            .within(store.clone()),
        Step::new(
            "delete vector store",
            ResourceKind::VectorStore,
            Operation::Delete,
            store,
        ),
        Step::new(
            "delete attachment",
            ResourceKind::File,
            Operation::Delete,
            file,
        ),
    ]
}

fn dataset_steps() -> Vec<Step> {
    let team_dataset = Target::Fixture(FixtureKind::Dataset);
    vec![
        Step::list("list datasets", ResourceKind::Dataset),
        Step::new(
            "register dataset",
            ResourceKind::Dataset,
            Operation::Create,
            Target::Generated("demo-test-dataset"),
        )
        .produces(Slot::Dataset),
        Step::new(
            "read team dataset",
            ResourceKind::Dataset,
            Operation::Read,
            team_dataset.clone(),
        ),
        Step::new(
            "iterate team dataset rows",
            ResourceKind::Dataset,
            Operation::Read,
            team_dataset,
        )
        .rows(),
        Step::new(
            "delete own dataset",
            ResourceKind::Dataset,
            Operation::Delete,
            Target::Produced(Slot::Dataset),
        ),
        Step::list("read sql records", ResourceKind::SqlRecord),
    ]
}

/// Run-once check: listing models without a token must be refused.
#[must_use]
pub fn anonymous_baseline() -> Step {
    let mut step = Step::list("list models without token", ResourceKind::Model);
    step.expectation = Expectation::Fixed(Decision::Denied);
    step
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_models_include_admin_only_model() {
        let names: Vec<String> = steps(Suite::Models, &SuiteRunnerConfig::default())
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            names,
            [
                "list models",
                "chat with vllm-inference/llama-3-2-3b",
                "chat with openai/gpt-4o-mini",
                "chat with openai/gpt-4o",
            ]
        );
    }

    #[test]
    fn every_suite_has_steps() {
        let cfg = SuiteRunnerConfig::default();
        for suite in Suite::ALL {
            assert!(!steps(suite, &cfg).is_empty(), "{suite}");
        }
    }

    #[test]
    fn produced_slots_are_filled_before_use() {
        let cfg = SuiteRunnerConfig::default();
        for suite in Suite::ALL {
            let mut filled = Vec::new();
            for step in steps(suite, &cfg) {
                for target in step.prerequisites() {
                    if let Target::Produced(slot) = target {
                        assert!(filled.contains(slot), "{suite}: {}", step.name);
                    }
                }
                filled.extend(step.produces);
            }
        }
    }

    #[test]
    fn fixture_steps_only_in_fixture_suites() {
        let cfg = SuiteRunnerConfig::default();
        for suite in Suite::ALL {
            let uses_fixture = steps(suite, &cfg)
                .iter()
                .any(|s| s.prerequisites().any(|t| matches!(t, Target::Fixture(_))));
            assert_eq!(uses_fixture, suite.needs_fixtures(), "{suite}");
        }
    }

    #[test]
    fn model_suite_covers_configured_models() {
        let cfg = SuiteRunnerConfig {
            models: vec!["a/b".to_owned()],
            ..SuiteRunnerConfig::default()
        };
        let names: Vec<String> = steps(Suite::Models, &cfg)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["list models", "chat with a/b"]);
    }

    #[test]
    fn baseline_is_fixed_denied() {
        assert_eq!(
            anonymous_baseline().expectation,
            Expectation::Fixed(Decision::Denied)
        );
    }
}
