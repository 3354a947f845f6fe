//! Category handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension, Json,
};

use crate::{parse_json, AppError, AppState, AuthUser, SuccessResponse};
use spendwise_core::models::{Category, NewCategory};

/// GET /api/categories - List the user's categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.service.list_categories(user.id)?))
}

/// GET /api/categories/:id
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(state.service.get_category(user.id, id)?))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<Category>, AppError> {
    let req: NewCategory = parse_json(&body)?;
    Ok(Json(state.service.create_category(user.id, &req)?))
}

/// PUT /api/categories/:id
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Category>, AppError> {
    let req: NewCategory = parse_json(&body)?;
    Ok(Json(state.service.update_category(user.id, id, &req)?))
}

/// DELETE /api/categories/:id - Expenses keep existing but lose the category
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.service.delete_category(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}
