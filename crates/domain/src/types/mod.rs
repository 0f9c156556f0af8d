//! Domain types and models
//!
//! Shapes mirror the backend's JSON schemas field for field.

pub mod auth;
pub mod media;
pub mod user;

pub use auth::{LoginRequest, RefreshRequest, TokenResponse};
pub use media::{censored_file_name, CensorOptions, MediaItem};
pub use user::{ChangeRoleRequest, Role, User, UserCreate};
