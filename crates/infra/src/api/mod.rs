//! PrivacyGuard REST client
//!
//! This module provides the authenticated API client and a typed method for
//! every backend endpoint.
//!
//! # Architecture
//!
//! - Uses the transport-level `HttpClient` (no direct reqwest client)
//! - Bearer credential from the shared `Session`, attached per attempt
//! - 401 recovery through the session's `RefreshCoordinator`, at most one
//!   retry per call
//! - Forced logout when recovery is impossible
//!
//! # Endpoints
//!
//! - [`auth`]: register, login, refresh, logout, current profile
//! - [`users`]: admin user management
//! - [`media`]: upload, list, inspect, download, delete

pub mod auth;
pub mod client;
pub mod errors;
pub mod media;
pub mod users;

pub use client::{ApiClient, ApiRequest, FilePart};
pub use errors::{ApiError, ApiErrorCategory};
pub use media::MediaUpload;
