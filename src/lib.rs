//! # AeroStack SDK
//!
//! Thin client library for the AeroStack platform REST API. Builds
//! request URIs from templated service paths, attaches token
//! authentication headers, serializes JSON payloads and dispatches the
//! call through `reqwest`.
//!
//! Modules:
//! - `config` — SDK settings, loaded from a YAML file named by the environment
//! - `parser` — service-path templates and placeholder substitution
//! - `auth` — token attachment for outgoing requests
//! - `client` — per-service request builder and dispatcher
//! - `identity` — identity-service session: issue, validate and revoke tokens

pub mod auth;
pub mod client;
pub mod config;
pub mod identity;
pub mod parser;
pub mod tests;
pub mod utils;

pub use crate::auth::TokenAuth;
pub use crate::client::{ApiClient, CallArgs};
pub use crate::config::settings::{settings, Settings};
pub use crate::parser::template::PathTemplate;
