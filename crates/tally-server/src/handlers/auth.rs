//! Authentication-related handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::{AppError, AppState, AuthMethod, AuthUser};

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// Identifier from the identity provider
    pub user: String,
    /// How the user was authenticated
    pub auth_method: AuthMethod,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

/// Get the currently authenticated user, creating the local row on first call
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>, AppError> {
    let user = state.resolve_user(&auth)?;

    Ok(Json(MeResponse {
        user: user.external_id,
        auth_method: auth.method,
        name: user.name,
        email: user.email,
        image_url: user.image_url,
    }))
}

/// Health check
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
