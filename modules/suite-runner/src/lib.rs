#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Suite runner
//!
//! Runs the selected suites for every selected identity, compares each
//! observed outcome with the policy model's prediction and aggregates the
//! verdicts into a [`RunReport`].
//!
//! ## Ordering
//!
//! The fixture phase runs first: the designated creator finds or creates
//! the team-owned vector store and dataset. Units of (identity, suite) run
//! afterwards, one at a time unless `parallel` is raised. Steps within a
//! unit always run in order.
//!
//! ## Configuration
//!
//! ```yaml
//! runner:
//!   creator: "developer"
//!   vector_store_fixture: "vs_mlteam_team"
//!   dataset_fixture: "ds_mlteam_team"
//!   models: ["vllm-inference/llama-3-2-3b", "openai/gpt-4o-mini", "openai/gpt-4o"]
//!   parallel: 1
//!   cleanup_fixtures: false
//! ```

pub mod config;
pub mod domain;

pub use config::{DEFAULT_MODELS, SuiteRunnerConfig};
pub use domain::{
    AuthFailure, CaseResult, ReportError, RunPlan, RunReport, RunStatus, Suite, SuiteError,
    SuiteRunner, Tally, Verdict, parse_suites,
};
