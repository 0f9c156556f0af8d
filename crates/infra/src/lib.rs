//! # PrivacyGuard Infrastructure
//!
//! I/O side of the PrivacyGuard client.
//!
//! This crate contains:
//! - HTTP transport with optional transport-level retries
//! - The authenticated REST client (`ApiClient`) and its typed endpoints
//! - Configuration loading from files and environment variables
//!
//! ## Architecture
//! - Session state and refresh coordination come from `privacyguard-common`
//! - Wire types and errors come from `privacyguard-domain`
//! - Contains all network-facing code

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{ApiClient, ApiError, ApiErrorCategory, ApiRequest, FilePart, MediaUpload};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
