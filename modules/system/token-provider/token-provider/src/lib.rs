#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Token provider
//!
//! Obtains OAuth2 access tokens for harness identities with the
//! resource-owner password grant and keeps them in a per-identity file cache.
//!
//! ## Configuration
//!
//! ```yaml
//! token_provider:
//!   idp_url: "https://kc-keycloak.com"
//!   realm: "llamastack-demo"
//!   client_id: "llamastack"
//!   cache_dir: "/home/me/.cache/llamastack-demo"
//! ```

pub mod config;
pub mod domain;

pub use config::TokenProviderConfig;
pub use domain::{DomainError, Service, TokenCache};
