//! # SII Authentication Library
//!
//! Obtains a short-lived SII access token: request a seed, sign it with
//! the client certificate, exchange the signed document for a token.
//!
//! Modules:
//! - `auth` : the seed → sign → token state machine and credentials
//! - `config` : YAML configuration, defaults and validation
//! - `parser` : SOAP envelope and embedded fragment unwrapping
//! - `resilience` : retry policy and the service-unavailable check
//! - `transport` / `signer` : collaborators and their default implementations

pub mod auth;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod parser;
pub mod resilience;
pub mod signer;
pub mod transport;
pub mod utils;
#[cfg(test)]
pub mod tests;

pub use crate::auth::{Authenticator, Credential, Stage};
pub use crate::config::service::{Environment, ServiceConfig};
pub use crate::error::{AuthError, AuthResult};
