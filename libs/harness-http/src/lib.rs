#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! HTTP plumbing shared by the token provider and the resource probes.

pub mod client;
pub mod config;
pub mod error;
pub mod retry;

pub use client::{build_client, endpoint};
pub use config::HttpClientConfig;
pub use error::HttpError;
pub use retry::{Retryable, RetryPolicy};
