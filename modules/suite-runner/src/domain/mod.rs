//! Domain layer for the suite runner.

pub mod error;
pub mod fixtures;
pub mod plan;
pub mod render;
pub mod report;
pub mod service;
pub mod suite;
pub mod verifier;

pub use error::{ReportError, SuiteError};
pub use fixtures::{FixtureHandle, FixtureKind, FixtureState, RunFixtures};
pub use render::Rendered;
pub use report::{AuthFailure, CaseResult, RunReport, RunStatus, Tally};
pub use service::{RunPlan, SuiteRunner};
pub use suite::{Suite, parse_suites};
pub use verifier::{Verdict, verify};
