//! CLI commands - one function per user-facing operation
//!
//! Commands take the [`AppContext`](crate::context::AppContext) explicitly and
//! return domain results; rendering is left to the caller.

pub mod auth;
pub mod media;
pub mod users;
