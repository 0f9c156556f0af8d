//! PrivacyGuard - media privacy client
//!
//! Main entry point for the `privacyguard` command-line tool.

use clap::Parser;
use privacyguard_lib::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env before config resolution
    dotenvy::dotenv().ok();

    run(Cli::parse()).await
}
