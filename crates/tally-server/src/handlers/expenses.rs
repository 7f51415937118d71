//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    Extension, Form, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{AppError, AppState, AuthUser, MAX_PAGE_LIMIT};
use tally_core::models::ExpenseRecord;
use tally_core::validation::ExpenseForm;

/// Default number of records in the recent list
pub const DEFAULT_RECENT_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListExpensesQuery {
    pub limit: Option<i64>,
}

/// GET /api/expenses - The user's expenses, newest expense date first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<ListExpensesQuery>,
) -> Result<Json<Vec<ExpenseRecord>>, AppError> {
    let user = state.resolve_user(&auth)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);

    let records = state.db.list_expenses(user.id, None, Some(limit))?;

    state.db.log_audit(
        &auth.external_id,
        "list",
        Some("expense"),
        None,
        Some(&format!("limit={}, count={}", limit, records.len())),
    )?;

    Ok(Json(records))
}

/// POST /api/expenses - Record an expense from a JSON body or a submitted form
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    request: Request,
) -> Result<(StatusCode, Json<ExpenseRecord>), AppError> {
    let form = read_expense_form(request).await?;
    let expense = form
        .validate()
        .map_err(|e| AppError::bad_request(&e.to_string()))?;

    let user = state.resolve_user(&auth)?;
    let record = state.db.create_expense(user.id, &expense)?;

    state.db.log_audit(
        &auth.external_id,
        "create",
        Some("expense"),
        Some(record.id),
        Some(&format!("amount={:.2}, category={}", record.amount, record.category)),
    )?;

    info!(expense_id = record.id, user = %auth.external_id, "Expense recorded");

    Ok((StatusCode::CREATED, Json(record)))
}

async fn read_expense_form(request: Request) -> Result<ExpenseForm, AppError> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(form) = Form::<ExpenseForm>::from_request(request, &())
            .await
            .map_err(|e| AppError::bad_request(&e.body_text()))?;
        Ok(form)
    } else {
        let Json(form) = Json::<ExpenseForm>::from_request(request, &())
            .await
            .map_err(|e| AppError::bad_request(&e.body_text()))?;
        Ok(form)
    }
}

/// GET /api/expenses/:id - One of the user's expenses
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<ExpenseRecord>, AppError> {
    let user = state.resolve_user(&auth)?;
    let record = state
        .db
        .get_expense(user.id, id)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    state
        .db
        .log_audit(&auth.external_id, "get", Some("expense"), Some(id), None)?;

    Ok(Json(record))
}

/// DELETE /api/expenses/:id - Remove one of the user's expenses
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let user = state.resolve_user(&auth)?;

    if !state.db.delete_expense(user.id, id)? {
        return Err(AppError::not_found("Expense not found"));
    }

    state
        .db
        .log_audit(&auth.external_id, "delete", Some("expense"), Some(id), None)?;

    Ok(StatusCode::NO_CONTENT)
}
