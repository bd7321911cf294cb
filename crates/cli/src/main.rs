//! Account portal CLI - database management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the users table and the session table
//! portal-cli migrate
//! ```
//!
//! The server applies the same migrations on startup; this command is for
//! preparing a database before the first deploy.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "portal-cli")]
#[command(author, version, about = "Account portal CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::migrate::MigrationError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
    }
    Ok(())
}
