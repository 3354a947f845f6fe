//! Server command implementation

use std::path::Path;

use anyhow::Result;
use spendwise_core::auth::{JWT_EXPIRATION_ENV, JWT_SECRET_ENV};
use spendwise_core::TokenIssuer;
use spendwise_server::{ServerConfig, ALLOWED_ORIGINS_ENV};

use super::open_service;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_encrypt: bool) -> Result<()> {
    println!("🚀 Starting Spendwise API server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let service = open_service(db_path, no_encrypt)?;
    let tokens = TokenIssuer::from_env();
    let config = ServerConfig::from_env();

    if std::env::var(JWT_SECRET_ENV).map(|s| s.is_empty()).unwrap_or(true) {
        println!(
            "   ⚠️  {} not set - tokens will not survive a restart",
            JWT_SECRET_ENV
        );
    }
    println!(
        "   🔑 Token lifetime: {} minutes ({})",
        tokens.expiration_minutes(),
        JWT_EXPIRATION_ENV
    );
    if config.allowed_origins.is_empty() {
        println!("   🌐 CORS: same-origin only");
    } else {
        println!(
            "   🌐 CORS origins: {} ({})",
            config.allowed_origins.join(", "),
            ALLOWED_ORIGINS_ENV
        );
    }
    match service.classifier().external() {
        Some(client) => {
            let info = client.info();
            println!("   🤖 Classifier: {} ({})", info.backend, info.model);
        }
        None => println!("   💡 Tip: Set GEMINI_API_KEY for model-backed categorization"),
    }

    spendwise_server::serve(service, tokens, host, port, config).await
}
