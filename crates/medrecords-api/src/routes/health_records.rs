use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use medrecords_db::types::{HealthRecordParams, HealthRecordRow};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;

use crate::attachments::{self, HealthRecordDetail, HealthRecordResponse};
use crate::auth::AuthUser;
use crate::constants::{MAX_NAME_LENGTH, MAX_TEXT_LENGTH};
use crate::error::AppError;
use crate::routes::files::remove_blobs;
use crate::routes::patients::load_patient;
use crate::state::AppState;
use crate::validation::{validate_optional_length, validate_string_length};

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HealthRecordRequest {
    patient_id: i64,
    #[ts(optional)]
    hospital_id: Option<i64>,
    title: String,
    #[ts(optional)]
    diagnosis: Option<String>,
    #[ts(optional)]
    notes: Option<String>,
    visit_date: NaiveDate,
}

impl HealthRecordRequest {
    fn into_params(self) -> Result<HealthRecordParams, AppError> {
        validate_string_length(&self.title, 1, MAX_NAME_LENGTH, "title")?;
        validate_optional_length(self.diagnosis.as_deref(), MAX_TEXT_LENGTH, "diagnosis")?;
        validate_optional_length(self.notes.as_deref(), MAX_TEXT_LENGTH, "notes")?;
        Ok(HealthRecordParams {
            patient_id: self.patient_id,
            hospital_id: self.hospital_id,
            title: self.title.trim().to_string(),
            diagnosis: self.diagnosis,
            notes: self.notes,
            visit_date: self.visit_date,
        })
    }
}

/// Load a health record the caller is allowed to see
pub(crate) async fn load_record(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> Result<HealthRecordRow, AppError> {
    let record = medrecords_db::health_records::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Health record not found".into()))?;
    user.require_patient_access(record.patient_id)?;
    Ok(record)
}

/// GET /api/patients/{id}/health-records
pub async fn list_for_patient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<HealthRecordResponse>>, AppError> {
    load_patient(&state, &user, patient_id).await?;

    let records = medrecords_db::health_records::list_for_patient(&state.pool, patient_id).await?;
    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    let files = medrecords_db::files::list_for_records(&state.pool, &ids).await?;

    let responses =
        attachments::record_responses(&*state.access_urls, &state.files_container, records, files)
            .await?;
    Ok(Json(responses))
}

/// GET /api/health-records/{id}
/// Returns the record with its files, prescriptions and procedures.
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<HealthRecordDetail>, AppError> {
    let record = load_record(&state, &user, id).await?;

    let (files, prescriptions, procedures) = tokio::try_join!(
        medrecords_db::files::list_for_record(&state.pool, id),
        medrecords_db::prescriptions::list_for_record(&state.pool, id),
        medrecords_db::procedures::list_for_record(&state.pool, id),
    )?;

    let files = attachments::file_responses(
        &*state.access_urls,
        &state.files_container,
        record.doctor_account_id,
        files,
    )
    .await?;

    Ok(Json(HealthRecordDetail {
        record,
        files,
        prescriptions,
        procedures,
    }))
}

/// POST /api/health-records
/// The calling account becomes the record's attending doctor.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<HealthRecordRequest>,
) -> Result<(StatusCode, Json<HealthRecordResponse>), AppError> {
    user.require_clinician()?;
    let params = body.into_params()?;
    load_patient(&state, &user, params.patient_id).await?;

    let record =
        medrecords_db::health_records::create(&state.pool, user.account_id, &params).await?;

    info!(
        record_id = record.id,
        patient_id = record.patient_id,
        doctor_account_id = record.doctor_account_id,
        "Created health record"
    );

    Ok((
        StatusCode::CREATED,
        Json(HealthRecordResponse {
            record,
            files: Vec::new(),
        }),
    ))
}

/// PUT /api/health-records/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<HealthRecordRequest>,
) -> Result<Json<HealthRecordResponse>, AppError> {
    user.require_clinician()?;
    let params = body.into_params()?;

    let record = medrecords_db::health_records::update(&state.pool, id, &params)
        .await?
        .ok_or_else(|| AppError::NotFound("Health record not found".into()))?;

    let files = medrecords_db::files::list_for_record(&state.pool, id).await?;
    let files = attachments::file_responses(
        &*state.access_urls,
        &state.files_container,
        record.doctor_account_id,
        files,
    )
    .await?;

    info!(record_id = id, updated_by = user.account_id, "Updated health record");
    Ok(Json(HealthRecordResponse { record, files }))
}

/// DELETE /api/health-records/{id}
/// Removes the record, its children and the attachment blobs.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_clinician()?;

    let files = medrecords_db::files::list_for_record(&state.pool, id).await?;
    if !medrecords_db::health_records::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Health record not found".into()));
    }
    let file_count = files.len();
    remove_blobs(&state, files.into_iter().map(|f| f.blob_name).collect()).await;

    info!(
        record_id = id,
        files = file_count,
        deleted_by = user.account_id,
        "Deleted health record"
    );
    Ok(Json(json!({ "success": true })))
}
