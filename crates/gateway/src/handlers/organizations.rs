//! Organization record read handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::AppState;
use docqa_common::{
    errors::{AppError, Result},
    types::OrganizationRecord,
};

/// List every stored organization record
pub async fn list_organizations(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrganizationRecord>>> {
    Ok(Json(state.store.list_all().await?))
}

/// Get one record by its internal id
pub async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrganizationRecord>> {
    let internal_id = Uuid::parse_str(&id).map_err(|e| AppError::InvalidFormat {
        message: format!("Invalid record id '{}': {}", id, e),
    })?;

    state
        .store
        .get_by_internal_id(internal_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound {
            resource_type: "organization".to_string(),
            id,
        })
}
