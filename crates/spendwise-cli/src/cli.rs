//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendwise - Track expenses, auto-categorize them, stay inside budgets
#[derive(Parser)]
#[command(name = "spendwise")]
#[command(about = "Self-hosted personal expense tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendwise.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SPENDWISE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: Option<UsersAction>,
    },

    /// Suggest a category for a merchant without saving anything
    Classify {
        /// Account email
        #[arg(short, long)]
        user: String,

        /// Merchant name
        #[arg(short, long)]
        merchant: String,

        /// Amount
        #[arg(short, long, default_value = "0")]
        amount: f64,

        /// Optional description passed to the classifier
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show spending against budgets for a month
    Alerts {
        /// Account email
        #[arg(short, long)]
        user: String,

        /// Month (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show this month's spending summary
    Summary {
        /// Account email
        #[arg(short, long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List registered users
    List,

    /// Register a user
    Add {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}
