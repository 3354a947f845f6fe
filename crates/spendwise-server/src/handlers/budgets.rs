//! Budget handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{parse_json, AppError, AppState, AuthUser, SuccessResponse};
use spendwise_core::models::{Budget, BudgetAlert, NewBudget};

/// GET /api/budgets
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Budget>>, AppError> {
    Ok(Json(state.service.list_budgets(user.id)?))
}

/// GET /api/budgets/:id
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Budget>, AppError> {
    Ok(Json(state.service.get_budget(user.id, id)?))
}

/// POST /api/budgets
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<Budget>, AppError> {
    let req: NewBudget = parse_json(&body)?;
    Ok(Json(state.service.create_budget(user.id, &req)?))
}

/// PUT /api/budgets/:id
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<Budget>, AppError> {
    let req: NewBudget = parse_json(&body)?;
    Ok(Json(state.service.update_budget(user.id, id, &req)?))
}

/// DELETE /api/budgets/:id
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.service.delete_budget(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Query parameters for budget alerts
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// Period token, defaults to the current month
    pub month: Option<String>,
}

/// GET /api/budgets/alerts?month=YYYY-MM - Spend against each budget in a month
pub async fn budget_alerts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AlertsQuery>,
) -> Result<Json<Vec<BudgetAlert>>, AppError> {
    Ok(Json(
        state
            .service
            .budget_alerts(user.id, params.month.as_deref())?,
    ))
}
