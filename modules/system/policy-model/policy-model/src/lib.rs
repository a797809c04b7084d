#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Policy model
//!
//! Predicts the access decision the resource API should make for a
//! subject, resource and operation. The rules are data: a YAML table that
//! is validated once when the model is built. Evaluation is pure and never
//! fails.
//!
//! ## Configuration
//!
//! ```yaml
//! policy:
//!   file: "./policies/llamastack-v1.yaml"   # omit for the built-in table
//! ```

pub mod config;
pub mod domain;

pub use config::PolicyModelConfig;
pub use domain::{PolicyModel, teams_intersect};
