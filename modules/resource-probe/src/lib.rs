#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Resource probes
//!
//! Each probe performs one operation against the LlamaStack API on behalf of
//! a [`harness_security::SecurityContext`] and reports what happened as an
//! [`Outcome`]. Probes never decide whether the outcome was right.

pub mod adapters;
pub mod api_client;
pub mod config;
pub mod error;
pub mod outcome;
pub mod probe;
pub mod registry;

pub use api_client::{ApiClient, RequestBody, Upload};
pub use config::{FREE_MODEL, McpProbeConfig, ResourceProbeConfig};
pub use error::ProbeError;
pub use outcome::{Outcome, classify};
pub use probe::{ProbeRequest, ResourceProbe};
pub use registry::ProbeRegistry;
