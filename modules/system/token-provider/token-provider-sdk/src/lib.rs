#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Token provider SDK
//!
//! This crate provides the public API for the `token_provider` module:
//!
//! - [`TokenProviderClient`] - Public API trait for consumers
//! - [`TokenRecord`] - Access token with issue and expiry timestamps
//! - [`TokenClaims`] - Claims read from the access token payload
//! - [`AuthError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use token_provider_sdk::{AuthOptions, TokenProviderClient};
//!
//! let record = provider.authenticate(&identity, AuthOptions::default()).await?;
//! let ctx = SecurityContext::for_identity(&identity, record.access_token.clone());
//! ```

pub mod api;
pub mod claims;
pub mod error;
pub mod models;

pub use api::TokenProviderClient;
pub use claims::TokenClaims;
pub use error::AuthError;
pub use models::{AuthOptions, EXPIRY_BUFFER_SECS, TokenRecord};
