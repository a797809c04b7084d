#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorization verification harness for LlamaStack deployments.

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;

pub use app::{Harness, STARTUP_FAILURE};
pub use cli::Cli;
pub use config::{AppConfig, ConfigError};
