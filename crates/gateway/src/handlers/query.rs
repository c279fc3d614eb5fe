//! Question answering handler

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use crate::services::QueryAnswer;
use crate::AppState;
use docqa_common::errors::{AppError, Result};

/// Questions are capped at 4000 characters
#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(length(min = 1, max = 4000))]
    pub question: String,
}

/// Answer a question against the organization's extracted data
#[instrument(skip(state, request))]
pub async fn query(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    request: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryAnswer>> {
    let Json(request) = request?;
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("question".to_string()),
    })?;

    let answer = state.query_pipeline().run(&org_id, &request.question).await?;
    Ok(Json(answer))
}
