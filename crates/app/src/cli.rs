//! Command-line interface
//!
//! Parses arguments, loads configuration, runs one command against a fresh
//! [`AppContext`] and renders the result as text or JSON.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use privacyguard_domain::{CensorOptions, MediaItem, Role, User, UserCreate};
use privacyguard_infra::config;
use serde::Serialize;

use crate::commands::{auth, media, users};
use crate::context::AppContext;
use crate::utils::logging::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "privacyguard", version, about = "PrivacyGuard media privacy client")]
pub struct Cli {
    /// Configuration file (TOML or JSON); probed when omitted
    #[arg(long, global = true, env = "PRIVACYGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PRIVACYGUARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PRIVACYGUARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the logged-in profile
    Whoami,
    /// Upload, inspect and download media
    #[command(subcommand)]
    Media(MediaCommand),
    /// Manage users (admin)
    #[command(subcommand)]
    Users(UsersCommand),
}

#[derive(Debug, Subcommand)]
pub enum MediaCommand {
    List,
    Show { id: i64 },
    /// Upload a file for censoring
    Upload {
        path: PathBuf,
        #[command(flatten)]
        targets: CensorTargets,
    },
    /// Save the processed file as censored_<name>
    Download {
        id: i64,
        #[arg(long, short = 'o', default_value = ".")]
        output_dir: PathBuf,
    },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    List,
    Show { id: i64 },
    /// Change a user's role
    SetRole { id: i64, role: String },
    Delete { id: i64 },
}

/// What to blur; both by default
#[derive(Debug, Args)]
pub struct CensorTargets {
    /// Leave faces untouched
    #[arg(long)]
    pub no_faces: bool,
    /// Leave license plates untouched
    #[arg(long)]
    pub no_plates: bool,
}

impl From<&CensorTargets> for CensorOptions {
    fn from(targets: &CensorTargets) -> Self {
        Self { faces: !targets.no_faces, plates: !targets.no_plates }
    }
}

/// Run the parsed command line to completion.
///
/// # Errors
/// Configuration, session and command failures, with context.
pub async fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.clone()).context("failed to load configuration")?;
    init_tracing(&config.logging);

    let ctx = AppContext::new(config).context("failed to initialize the session")?;
    ctx.on_forced_logout(|reason| {
        eprintln!("Your session has expired ({reason}). Please log in again.");
    });

    let outcome = dispatch(&ctx, cli.command, cli.json).await;
    ctx.shutdown();
    outcome
}

async fn dispatch(ctx: &AppContext, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Register { username, email, password } => {
            let user = auth::register(ctx, UserCreate { username, email, password }).await?;
            render(json, &user, |u| format!("Registered {}. You can now log in.", describe_user(u)))
        }
        Command::Login { email, password } => {
            let user = auth::login(ctx, email, password).await?;
            render(json, &user, |u| format!("Logged in as {}", describe_user(u)))
        }
        Command::Logout => {
            auth::logout(ctx).await?;
            render(json, &serde_json::json!({ "logged_out": true }), |_| "Logged out".into())
        }
        Command::Whoami => {
            let user = auth::whoami(ctx).await?;
            render(json, &user, describe_user)
        }
        Command::Media(command) => dispatch_media(ctx, command, json).await,
        Command::Users(command) => dispatch_users(ctx, command, json).await,
    }
}

async fn dispatch_media(ctx: &AppContext, command: MediaCommand, json: bool) -> Result<()> {
    match command {
        MediaCommand::List => {
            let items = media::list_media(ctx).await?;
            render(json, &items, |items| {
                if items.is_empty() {
                    return "No media yet".to_string();
                }
                items.iter().map(describe_media).collect::<Vec<_>>().join("\n")
            })
        }
        MediaCommand::Show { id } => {
            let item = media::show_media(ctx, id).await?;
            render(json, &item, describe_media)
        }
        MediaCommand::Upload { path, targets } => {
            let item = media::upload_media(ctx, &path, CensorOptions::from(&targets)).await?;
            render(json, &item, |item| format!("Uploaded: {}", describe_media(item)))
        }
        MediaCommand::Download { id, output_dir } => {
            let saved = media::download_media(ctx, id, &output_dir).await?;
            render(json, &serde_json::json!({ "path": saved }), |_| {
                format!("Saved {}", saved.display())
            })
        }
        MediaCommand::Delete { id } => {
            media::delete_media(ctx, id).await?;
            render(json, &serde_json::json!({ "deleted": id }), |_| format!("Deleted media {id}"))
        }
    }
}

async fn dispatch_users(ctx: &AppContext, command: UsersCommand, json: bool) -> Result<()> {
    match command {
        UsersCommand::List => {
            let all = users::list_users(ctx).await?;
            render(json, &all, |all| all.iter().map(describe_user).collect::<Vec<_>>().join("\n"))
        }
        UsersCommand::Show { id } => {
            let user = users::show_user(ctx, id).await?;
            render(json, &user, describe_user)
        }
        UsersCommand::SetRole { id, role } => {
            let user = users::set_role(ctx, id, Role::from(role.as_str())).await?;
            render(json, &user, |u| format!("Updated {}", describe_user(u)))
        }
        UsersCommand::Delete { id } => {
            users::delete_user(ctx, id).await?;
            render(json, &serde_json::json!({ "deleted": id }), |_| format!("Deleted user {id}"))
        }
    }
}

fn render<T: Serialize + ?Sized>(json: bool, value: &T, human: impl FnOnce(&T) -> String) -> Result<()> {
    let text = if json { serde_json::to_string_pretty(value)? } else { human(value) };
    println!("{text}");
    Ok(())
}

fn describe_user(user: &User) -> String {
    format!("#{} {} <{}> [{}]", user.id, user.username, user.email, user.role)
}

fn describe_media(item: &MediaItem) -> String {
    let state = if item.processed { "processed" } else { "pending" };
    match &item.description {
        Some(description) => format!("#{} {state} - {description}", item.id),
        None => format!("#{} {state}", item.id),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn upload_blurs_everything_by_default() {
        let cli = Cli::parse_from(["privacyguard", "media", "upload", "street.jpg", "--no-plates"]);
        let Command::Media(MediaCommand::Upload { path, targets }) = cli.command else {
            panic!("expected media upload");
        };
        assert_eq!(path, PathBuf::from("street.jpg"));
        assert_eq!(CensorOptions::from(&targets), CensorOptions { faces: true, plates: false });
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::parse_from(["privacyguard", "users", "set-role", "4", "admin", "--json"]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Users(UsersCommand::SetRole { id: 4, ref role }) if role == "admin"
        ));
    }
}
