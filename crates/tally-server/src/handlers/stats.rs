//! Statistics and chart handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, AuthUser};
use tally_core::aggregate::{bucket_by_day, chart_points, compute_summary, ChartPoint, StatisticsSummary};
use tally_core::models::ExpenseExtremes;

/// Default statistics window in days
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    /// Days to look back; 0 covers every record
    pub days: Option<i64>,
}

impl WindowQuery {
    fn since(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        match self.days.unwrap_or(DEFAULT_WINDOW_DAYS) {
            0 => Ok(None),
            d if d < 0 => Err(AppError::bad_request("days must not be negative")),
            d => Duration::try_days(d)
                .and_then(|window| Utc::now().checked_sub_signed(window))
                .map(Some)
                .ok_or_else(|| AppError::bad_request("days is out of range")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub summary: StatisticsSummary,
    pub expense_count: usize,
    /// Highest and lowest single expense ever recorded, ignoring the window
    pub all_time: ExpenseExtremes,
}

/// GET /api/stats - Summary statistics over the window
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<WindowQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let since = params.since()?;
    let user = state.resolve_user(&auth)?;
    let records = state.db.list_expenses(user.id, since, None)?;

    Ok(Json(StatsResponse {
        summary: compute_summary(&records),
        expense_count: records.len(),
        all_time: state.db.expense_extremes(user.id)?,
    }))
}

/// GET /api/chart - Daily totals over the window, oldest day first
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<WindowQuery>,
) -> Result<Json<Vec<ChartPoint>>, AppError> {
    let since = params.since()?;
    let user = state.resolve_user(&auth)?;
    let records = state.db.list_expenses(user.id, since, None)?;

    Ok(Json(chart_points(&bucket_by_day(&records))))
}
