//! Export handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Response, StatusCode},
    Extension,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{AppError, AppState, AuthUser};
use tally_core::export::ExpenseExportOptions;

/// Query parameters for expense export
#[derive(Debug, Deserialize)]
pub struct ExpenseExportQuery {
    /// Start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    pub to: Option<String>,
}

/// GET /api/export/expenses - Download the user's expenses as CSV
pub async fn export_expenses(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<ExpenseExportQuery>,
) -> Result<Response<Body>, AppError> {
    let from = params
        .from
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::bad_request("Invalid 'from' date format (use YYYY-MM-DD)"))?;

    let to = params
        .to
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::bad_request("Invalid 'to' date format (use YYYY-MM-DD)"))?;

    let opts = ExpenseExportOptions { from, to };
    let user = state.resolve_user(&auth)?;

    state.db.log_audit(
        &auth.external_id,
        "export",
        Some("expense"),
        None,
        Some(&format!("from={:?}, to={:?}", from, to)),
    )?;

    let csv = state.db.export_expenses_csv(user.id, &opts)?;
    let filename = format!("expenses-{}.csv", chrono::Utc::now().format("%Y%m%d"));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(csv))
        .map_err(|_| AppError::internal("Failed to build response"))
}
