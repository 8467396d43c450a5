use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use medrecords_db::types::{PrescriptionParams, PrescriptionRow};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;

use crate::auth::AuthUser;
use crate::constants::{MAX_NAME_LENGTH, MAX_TEXT_LENGTH};
use crate::error::AppError;
use crate::routes::health_records::load_record;
use crate::state::AppState;
use crate::validation::{validate_optional_length, validate_string_length};

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PrescriptionRequest {
    medication: String,
    dosage: String,
    frequency: String,
    start_date: NaiveDate,
    #[ts(optional)]
    end_date: Option<NaiveDate>,
    #[ts(optional)]
    notes: Option<String>,
}

impl PrescriptionRequest {
    fn into_params(self) -> Result<PrescriptionParams, AppError> {
        validate_string_length(&self.medication, 1, MAX_NAME_LENGTH, "medication")?;
        validate_string_length(&self.dosage, 1, MAX_NAME_LENGTH, "dosage")?;
        validate_string_length(&self.frequency, 1, MAX_NAME_LENGTH, "frequency")?;
        validate_optional_length(self.notes.as_deref(), MAX_TEXT_LENGTH, "notes")?;
        if matches!(self.end_date, Some(end) if end < self.start_date) {
            return Err(AppError::BadRequest(
                "endDate cannot be before startDate".into(),
            ));
        }
        Ok(PrescriptionParams {
            medication: self.medication.trim().to_string(),
            dosage: self.dosage.trim().to_string(),
            frequency: self.frequency.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            notes: self.notes,
        })
    }
}

/// GET /api/health-records/{id}/prescriptions
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<i64>,
) -> Result<Json<Vec<PrescriptionRow>>, AppError> {
    load_record(&state, &user, record_id).await?;
    let rows = medrecords_db::prescriptions::list_for_record(&state.pool, record_id).await?;
    Ok(Json(rows))
}

/// POST /api/health-records/{id}/prescriptions
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<i64>,
    Json(body): Json<PrescriptionRequest>,
) -> Result<(StatusCode, Json<PrescriptionRow>), AppError> {
    user.require_clinician()?;
    let params = body.into_params()?;
    load_record(&state, &user, record_id).await?;
    let row = medrecords_db::prescriptions::create(&state.pool, record_id, &params).await?;
    info!(prescription_id = row.id, record_id, "Added prescription");
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/prescriptions/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_clinician()?;
    if !medrecords_db::prescriptions::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Prescription not found".into()));
    }
    info!(prescription_id = id, "Deleted prescription");
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_date_before_start_rejected() {
        let req = PrescriptionRequest {
            medication: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency: "3x daily".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 10, 1),
            notes: None,
        };
        assert!(req.into_params().is_err());
    }

    #[test]
    fn test_open_ended_prescription() {
        let req = PrescriptionRequest {
            medication: "Levothyroxine".into(),
            dosage: "50mcg".into(),
            frequency: "daily".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 10).unwrap(),
            end_date: None,
            notes: None,
        };
        assert!(req.into_params().is_ok());
    }
}
