//! Spendwise CLI - Personal expense tracker
//!
//! Usage:
//!   spendwise init                         Initialize database
//!   spendwise users add -e EMAIL -p PASS   Register a user
//!   spendwise classify -u EMAIL -m SWIGGY  Suggest a category
//!   spendwise alerts -u EMAIL              Budget status for this month
//!   spendwise serve --port 3000            Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Serve { port, host } => {
            commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt).await
        }
        Commands::Users { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(UsersAction::List) => commands::cmd_users_list(&db),
                Some(UsersAction::Add { email, password }) => {
                    commands::cmd_users_add(&db, &email, &password).map(|_| ())
                }
            }
        }
        Commands::Classify {
            user,
            merchant,
            amount,
            description,
        } => {
            let service = commands::open_service(&cli.db, cli.no_encrypt)?;
            commands::cmd_classify(
                &service,
                &user,
                &merchant,
                amount,
                description.as_deref(),
                cli.json,
            )
            .await
        }
        Commands::Alerts { user, month } => {
            let service = commands::open_service(&cli.db, cli.no_encrypt)?;
            commands::cmd_alerts(&service, &user, month.as_deref(), cli.json)
        }
        Commands::Summary { user } => {
            let service = commands::open_service(&cli.db, cli.no_encrypt)?;
            commands::cmd_summary(&service, &user, cli.json)
        }
    }
}
