//! Domain layer for the policy model.

pub mod loader;
pub mod predicates;
pub mod service;

pub use loader::{DEFAULT_POLICY_YAML, load_table, parse_table};
pub use predicates::{roles_satisfy, teams_intersect};
pub use service::PolicyModel;
