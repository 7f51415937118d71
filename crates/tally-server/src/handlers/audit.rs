//! Activity trail handler

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, AuthUser, MAX_PAGE_LIMIT};
use tally_core::db::AuditEntry;

/// Entries returned when no limit is given
pub const DEFAULT_AUDIT_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}

/// GET /api/audit - The caller's own recent actions, newest first
pub async fn list_audit(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);

    Ok(Json(state.db.list_audit_log(&auth.external_id, limit)?))
}
