//! # PrivacyGuard Domain
//!
//! Business domain types and models for the PrivacyGuard client.
//!
//! This crate contains:
//! - Wire types exchanged with the PrivacyGuard REST backend (users, media,
//!   token payloads)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants (endpoint paths, persisted key names, defaults)
//!
//! ## Architecture
//! - No dependencies on other PrivacyGuard crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
