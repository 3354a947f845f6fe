//! Expense handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::{parse_json, AppError, AppState, AuthUser, SuccessResponse};
use spendwise_core::models::{ClassificationSuggestion, Expense, NewExpense};

/// GET /api/expenses - All of the user's expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Expense>>, AppError> {
    Ok(Json(state.service.list_expenses(user.id)?))
}

/// GET /api/expenses/:id
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    Ok(Json(state.service.get_expense(user.id, id)?))
}

/// POST /api/expenses - Create, classifying when no category is given
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<Expense>, AppError> {
    let req: NewExpense = parse_json(&body)?;
    Ok(Json(state.service.create_expense(user.id, &req).await?))
}

/// POST /api/expenses/bulk - Create several expenses in order
pub async fn bulk_create_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<Vec<Expense>>, AppError> {
    let req: Vec<NewExpense> = parse_json(&body)?;
    if req.is_empty() {
        return Err(AppError::bad_request("No expenses provided"));
    }
    Ok(Json(state.service.bulk_create_expenses(user.id, &req).await?))
}

/// PUT /api/expenses/:id
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Expense>, AppError> {
    let req: NewExpense = parse_json(&body)?;
    Ok(Json(state.service.update_expense(user.id, id, &req).await?))
}

/// DELETE /api/expenses/:id
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.service.delete_expense(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Response for POST /api/expenses/suggest
#[derive(Serialize)]
pub struct SuggestResponse {
    /// `None` when the draft has no merchant
    pub suggestion: Option<ClassificationSuggestion>,
}

/// POST /api/expenses/suggest - Classify a draft without saving it
pub async fn suggest_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<SuggestResponse>, AppError> {
    let req: NewExpense = parse_json(&body)?;
    let suggestion = state.service.suggest_category(user.id, &req).await?;
    Ok(Json(SuggestResponse { suggestion }))
}
