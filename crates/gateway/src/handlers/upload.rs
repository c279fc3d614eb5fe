//! File upload handler

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::instrument;

use crate::AppState;
use docqa_common::{
    errors::{AppError, Result},
    types::ExtractionResult,
};

const FILE_FIELD: &str = "file";

/// Response after a successful upload
#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(rename = "Data")]
    pub data: ExtractionResult,
}

/// Accept a multipart `file` field, extract it and store it for `org_id`
#[instrument(skip(state, headers, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    Path(org_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let limit = state.config.server.max_upload_bytes;
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let read_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge { size: declared, limit }
        } else {
            AppError::InvalidFormat { message: e.body_text() }
        }
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::MissingField {
                field: "file.filename".to_string(),
            })?;
        let bytes = field.bytes().await.map_err(read_error)?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| AppError::MissingField {
        field: FILE_FIELD.to_string(),
    })?;

    if bytes.len() > limit {
        return Err(AppError::PayloadTooLarge { size: bytes.len(), limit });
    }

    let data = state
        .upload_pipeline()
        .run(&org_id, &filename, bytes.to_vec())
        .await?;

    Ok(Json(UploadResponse {
        message: "File uploaded and data extracted successfully".to_string(),
        data,
    }))
}
