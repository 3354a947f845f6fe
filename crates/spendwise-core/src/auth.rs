//! Password hashing and bearer tokens
//!
//! Passwords are stored as Argon2id PHC strings with a random salt.
//! Tokens are HS256 JWTs carrying the user's email (`sub`) and id (`uid`).

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::User;

/// Environment variable holding the token signing secret
pub const JWT_SECRET_ENV: &str = "SPENDWISE_JWT_SECRET";

/// Environment variable holding the token lifetime in minutes
pub const JWT_EXPIRATION_ENV: &str = "SPENDWISE_JWT_EXPIRATION_MINUTES";

/// Default token lifetime
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 120;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Secrets shorter than this are stretched with SHA-256
const MIN_SECRET_BYTES: usize = 32;

/// Hash a password into an Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Reject passwords that are too short
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    /// User id
    pub uid: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates HS256 bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiration: Duration,
}

impl TokenIssuer {
    /// Create an issuer; secrets under 32 bytes are hashed to 32 bytes first
    pub fn new(secret: &[u8], expiration_minutes: i64) -> Self {
        let key: Vec<u8> = if secret.len() < MIN_SECRET_BYTES {
            Sha256::digest(secret).to_vec()
        } else {
            secret.to_vec()
        };
        Self {
            encoding: EncodingKey::from_secret(&key),
            decoding: DecodingKey::from_secret(&key),
            expiration: Duration::minutes(expiration_minutes),
        }
    }

    /// Create from `SPENDWISE_JWT_SECRET` and `SPENDWISE_JWT_EXPIRATION_MINUTES`
    ///
    /// Without a configured secret a random one is generated, so tokens do not
    /// survive a restart.
    pub fn from_env() -> Self {
        let expiration = std::env::var(JWT_EXPIRATION_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_EXPIRATION_MINUTES);

        match std::env::var(JWT_SECRET_ENV).ok().filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret.as_bytes(), expiration),
            None => {
                warn!(
                    "{} not set, using a random signing secret for this process",
                    JWT_SECRET_ENV
                );
                let mut secret = [0u8; MIN_SECRET_BYTES];
                OsRng.fill_bytes(&mut secret);
                Self::new(&secret, expiration)
            }
        }
    }

    pub fn expiration_minutes(&self) -> i64 {
        self.expiration.num_minutes()
    }

    /// Issue a token for a user
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id,
            iat: now.timestamp(),
            exp: (now + self.expiration).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Auth(format!("Failed to issue token: {}", e)))
    }

    /// Validate a token's signature and expiry
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::Auth(format!("Invalid token: {}", e)))
    }
}
