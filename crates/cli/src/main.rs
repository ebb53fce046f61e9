//! Mayombe Market CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run market database migrations
//! mayombe-cli migrate
//!
//! # Create an account with any role (admins, logisticians)
//! mayombe-cli user create -e admin@mayombe.cg -n "Admin" -r admin --password '...'
//!
//! # Change the role of an existing account
//! mayombe-cli user set-role -e livreur@mayombe.cg -r logistician
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mayombe-cli")]
#[command(author, version, about = "Mayombe Market CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run market database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account
    Create {
        /// Sign-in email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`buyer`, `vendor`, `logistician`, `admin`)
        #[arg(short, long, default_value = "buyer")]
        role: String,

        /// Initial password (at least 8 characters)
        #[arg(long)]
        password: String,
    },
    /// Change the role of an existing account
    SetRole {
        /// Sign-in email address
        #[arg(short, long)]
        email: String,

        /// New role
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::user::create(&email, &name, &role, &password).await?;
            }
            UserAction::SetRole { email, role } => {
                commands::user::set_role(&email, &role).await?;
            }
        },
    }
    Ok(())
}
