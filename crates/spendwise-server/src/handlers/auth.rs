//! Registration, login and the current user

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{parse_json, AppError, AppState, AuthUser};
use spendwise_core::auth::{hash_password, validate_password, verify_password};
use spendwise_core::models::User;

/// Request body for register and login
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Token issued on register or login
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in_minutes: i64,
    pub user: User,
}

fn token_response(state: &AppState, user: User) -> Result<Json<AuthResponse>, AppError> {
    let token = state.tokens.issue(&user)?;
    Ok(Json(AuthResponse {
        token,
        token_type: "Bearer",
        expires_in_minutes: state.tokens.expiration_minutes(),
        user,
    }))
}

/// POST /api/auth/register - Create an account and return a token
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AuthResponse>, AppError> {
    let req: Credentials = parse_json(&body)?;

    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("A valid email is required"));
    }
    validate_password(&req.password)?;

    if state.db().get_user_by_email(email)?.is_some() {
        return Err(AppError::conflict("Email is already registered"));
    }

    let hash = hash_password(&req.password)?;
    let id = state.db().create_user(email, &hash)?;
    let user = state
        .db()
        .get_user(id)?
        .ok_or_else(|| AppError::internal("User not found after creation"))?;

    info!(user_id = user.id, "Registered user");
    token_response(&state, user)
}

/// POST /api/auth/login - Verify credentials and return a token
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AuthResponse>, AppError> {
    let req: Credentials = parse_json(&body)?;

    let user = match state.db().get_user_by_email(&req.email)? {
        Some(user) if verify_password(&req.password, &user.password_hash) => user,
        _ => {
            warn!("Failed login attempt");
            return Err(AppError::unauthorized("Invalid credentials"));
        }
    };

    token_response(&state, user)
}

/// GET /api/me - The authenticated user
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    let user = state
        .db()
        .get_user(auth.id)?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;
    Ok(Json(user))
}
