#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Policy model SDK
//!
//! - [`PolicyEvaluator`] - Evaluation trait
//! - [`ResourceDescriptor`], [`Operation`], [`Subject`] - Evaluation inputs
//! - [`Evaluation`], [`Decision`] - Evaluation output
//! - [`PolicyTable`] - Declarative rule table
//! - [`PolicyError`] - Table validation errors
//!
//! ## Usage
//!
//! ```ignore
//! use policy_model_sdk::{Operation, PolicyEvaluator, ResourceDescriptor, ResourceKind, Subject};
//!
//! let subject = Subject::from(&identity);
//! let target = ResourceDescriptor::item(ResourceKind::Model, "openai/gpt-4o-mini");
//! let eval = policy.expected(&subject, &target, Operation::Read);
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod table;

pub use api::PolicyEvaluator;
pub use error::PolicyError;
pub use models::{
    Decision, Evaluation, Operation, Owner, ResourceDescriptor, ResourceKind, Subject,
};
pub use table::{Ownership, PolicyRule, PolicyTable, ResourcePolicy, SUPPORTED_VERSION, Scope};
