//! User account commands

use anyhow::{bail, Context, Result};
use spendwise_core::auth::{hash_password, validate_password};
use spendwise_core::db::Database;

pub fn cmd_users_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No users yet. Create one with:");
        println!("  spendwise users add -e you@example.com -p <password>");
        return Ok(());
    }

    println!();
    println!("👤 Users");
    println!("   ─────────────────────────────");

    for user in users {
        println!(
            "   {:>4}  {}  (since {})",
            user.id,
            user.email,
            user.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

pub fn cmd_users_add(db: &Database, email: &str, password: &str) -> Result<i64> {
    let email = email.trim();
    if !email.contains('@') {
        bail!("'{}' is not a valid email address", email);
    }
    validate_password(password)?;
    if db.get_user_by_email(email)?.is_some() {
        bail!("User '{}' already exists", email);
    }

    let hash = hash_password(password)?;
    let id = db
        .create_user(email, &hash)
        .context("Failed to create user")?;

    println!("✅ Created user {} (id {})", email.to_lowercase(), id);
    Ok(id)
}
