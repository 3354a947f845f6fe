//! Spending analytics handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};

use crate::{AppError, AppState, AuthUser};
use spendwise_core::models::{CategoryTotal, MonthlySummary, TrendPoint};

/// GET /api/analytics/monthly - This month so far against last month
pub async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MonthlySummary>, AppError> {
    Ok(Json(state.service.monthly_summary(user.id)?))
}

/// GET /api/analytics/category - All-time totals per category
pub async fn category_breakdown(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CategoryTotal>>, AppError> {
    Ok(Json(state.service.category_breakdown(user.id)?))
}

/// GET /api/analytics/trends - Monthly totals for the last 12 months
pub async fn trends(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TrendPoint>>, AppError> {
    Ok(Json(state.service.trends(user.id)?))
}
