//! AI handlers
//!
//! These always answer 200: failures inside the AI actions come back as
//! fallback content rather than errors.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{AppState, AuthUser};
use tally_core::ai::Insight;
use tally_core::insights::{self, CategorySuggestion};

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    #[serde(default)]
    pub description: String,
}

/// POST /api/categorize - Suggest a category for a description
pub async fn categorize(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CategorizeRequest>,
) -> Json<CategorySuggestion> {
    Json(insights::suggest_category(state.ai.as_ref(), &body.description).await)
}

/// GET /api/insights - Insights about the user's recent expenses
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<Vec<Insight>> {
    let user = match state.resolve_user(&auth) {
        Ok(user) => user,
        Err(_) => {
            warn!(user = %auth.external_id, "Could not resolve user for insights");
            return Json(insights::unavailable_insights());
        }
    };

    if let Err(e) = state
        .db
        .log_audit(&auth.external_id, "insights", Some("expense"), None, None)
    {
        warn!(user = %auth.external_id, error = %e, "Failed to record insights request");
    }

    Json(insights::expense_insights(&state.db, state.ai.as_ref(), user.id).await)
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
}

/// POST /api/insights/answer - Answer a question about recent expenses
pub async fn answer_question(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<AnswerRequest>,
) -> Json<AnswerResponse> {
    let answer = match state.resolve_user(&auth) {
        Ok(user) => {
            insights::answer_insight_question(
                &state.db,
                state.ai.as_ref(),
                user.id,
                &body.question,
            )
            .await
        }
        Err(_) => {
            warn!(user = %auth.external_id, "Could not resolve user for question");
            insights::ANSWER_UNAVAILABLE.to_string()
        }
    };

    Json(AnswerResponse { answer })
}
