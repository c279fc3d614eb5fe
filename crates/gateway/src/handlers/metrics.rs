//! Prometheus exposition endpoint

use axum::extract::State;
use crate::AppState;
use docqa_common::errors::{AppError, Result};

pub async fn metrics(State(state): State<AppState>) -> Result<String> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| AppError::NotFound {
            resource_type: "endpoint".to_string(),
            id: "/metrics".to_string(),
        })
}
