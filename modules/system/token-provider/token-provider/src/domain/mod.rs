//! Domain layer for the token provider.

pub mod cache;
pub mod client;
pub mod error;
pub mod password_grant;
pub mod service;

pub use cache::{CacheError, TokenCache};
pub use error::DomainError;
pub use password_grant::PasswordGrant;
pub use service::Service;
