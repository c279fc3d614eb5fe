//! Browser telemetry handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::AppState;
use docqa_common::{errors::Result, telemetry::TelemetryPayload};

#[derive(Serialize)]
pub struct TelemetryResponse {
    pub status: String,
}

pub async fn collect(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TelemetryPayload>, JsonRejection>,
) -> Result<Json<TelemetryResponse>> {
    let Json(payload) = payload?;
    let outcome = state.telemetry_pipeline().ingest(&payload).await?;

    Ok(Json(TelemetryResponse {
        status: outcome.status().to_string(),
    }))
}
