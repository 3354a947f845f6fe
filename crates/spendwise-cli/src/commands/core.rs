//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `open_service` - Database plus classifier, configured from the environment
//! - `find_user` - Resolve an account by email
//! - `cmd_init` - Initialize the database

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use spendwise_core::models::User;
use spendwise_core::{db::Database, Classifier, ExpenseService};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Open the database and build the expense service around it
pub fn open_service(db_path: &Path, no_encrypt: bool) -> Result<ExpenseService> {
    let db = open_db(db_path, no_encrypt)?;
    Ok(ExpenseService::new(db, Arc::new(Classifier::from_env())))
}

/// Look up a user by email, failing with a hint when absent
pub fn find_user(db: &Database, email: &str) -> Result<User> {
    db.get_user_by_email(email)?.with_context(|| {
        format!(
            "No user with email '{}'. Create one with: spendwise users add -e {} -p <password>",
            email, email
        )
    })
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Create a user: spendwise users add -e you@example.com -p <password>");
    println!("  2. Start the API: spendwise serve");

    Ok(())
}
