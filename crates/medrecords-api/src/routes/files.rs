use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use medrecords_db::types::CreateFileParams;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use ts_rs::TS;

use crate::attachments::{self, FileResponse};
use crate::auth::AuthUser;
use crate::constants::{MAX_FILE_BYTES, MAX_FILE_NAME_LENGTH};
use crate::error::AppError;
use crate::routes::health_records::load_record;
use crate::state::AppState;
use crate::validation::validate_string_length;

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct UploadFileRequest {
    file_name: String,
    content_type: String,
    /// base64, optionally as a `data:` URL
    data: String,
}

/// GET /api/health-records/{id}/files
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<i64>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    let record = load_record(&state, &user, record_id).await?;
    let files = medrecords_db::files::list_for_record(&state.pool, record_id).await?;
    let files = attachments::file_responses(
        &*state.access_urls,
        &state.files_container,
        record.doctor_account_id,
        files,
    )
    .await?;
    Ok(Json(files))
}

/// POST /api/health-records/{id}/files
/// Uploads the bytes to blob storage, then records the attachment.
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<i64>,
    Json(body): Json<UploadFileRequest>,
) -> Result<(StatusCode, Json<FileResponse>), AppError> {
    user.require_clinician()?;
    validate_string_length(&body.file_name, 1, MAX_FILE_NAME_LENGTH, "fileName")?;
    validate_string_length(&body.content_type, 1, 255, "contentType")?;
    let bytes = attachments::decode_upload(&body.data, MAX_FILE_BYTES)?;

    let record = load_record(&state, &user, record_id).await?;
    let blob_name = attachments::blob_name(record.doctor_account_id, &body.file_name);
    let size_bytes = bytes.len() as i64;

    state
        .blobs
        .upload(&state.files_container, &blob_name, &body.content_type, bytes)
        .await?;

    let params = CreateFileParams {
        health_record_id: record_id,
        file_name: body.file_name.trim().to_string(),
        content_type: body.content_type,
        blob_name,
        size_bytes,
        uploaded_by: user.account_id,
    };
    let row = match medrecords_db::files::create(&state.pool, &params).await {
        Ok(row) => row,
        Err(e) => {
            // Don't leave an unreferenced blob behind
            remove_blobs(&state, vec![params.blob_name.clone()]).await;
            return Err(e.into());
        }
    };

    info!(
        file_id = row.id,
        record_id,
        blob = %row.blob_name,
        size_bytes,
        "Uploaded health record file"
    );

    let mut files = attachments::file_responses(
        &*state.access_urls,
        &state.files_container,
        record.doctor_account_id,
        vec![row],
    )
    .await?;
    let file = files
        .pop()
        .ok_or_else(|| AppError::Internal("uploaded file missing from response".into()))?;

    Ok((StatusCode::CREATED, Json(file)))
}

/// DELETE /api/files/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_clinician()?;

    let file = medrecords_db::files::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    medrecords_db::files::delete(&state.pool, id).await?;
    info!(file_id = id, blob = %file.blob_name, "Deleted health record file");

    // The row is gone either way; a blob left behind is only logged
    remove_blobs(&state, vec![file.blob_name]).await;

    Ok(Json(json!({ "success": true })))
}

/// Best-effort removal of blobs whose rows are already gone.
/// Returns how many could not be deleted.
pub(crate) async fn remove_blobs(state: &AppState, blob_names: Vec<String>) -> usize {
    let mut failed = 0;
    for blob in &blob_names {
        if let Err(e) = state.blobs.delete(&state.files_container, blob).await {
            warn!(error = %e, blob = %blob, "Failed to delete orphaned blob");
            failed += 1;
        }
    }
    failed
}
