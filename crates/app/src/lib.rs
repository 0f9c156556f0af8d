//! # PrivacyGuard App
//!
//! Command-line host for the PrivacyGuard client.
//!
//! This crate contains:
//! - The `privacyguard` CLI (argument parsing and rendering)
//! - Application context (session ownership and wiring)
//! - One command function per user-facing operation
//!
//! ## Architecture
//! - Depends on `domain`, `common`, and `infra`
//! - Owns the session lifecycle: init on start, teardown on exit
//! - Reacts to forced logout by telling the user to log in again

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use context::AppContext;
