//! Utility helpers shared by the CLI commands

pub mod command_helpers;
pub mod logging;
