use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use medrecords_db::types::{AllergyParams, AllergyRow};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;

use crate::auth::AuthUser;
use crate::constants::{ALLERGY_SEVERITIES, MAX_NAME_LENGTH, MAX_TEXT_LENGTH};
use crate::error::AppError;
use crate::routes::patients::load_patient;
use crate::state::AppState;
use crate::validation::{validate_optional_length, validate_string_length};

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AllergyRequest {
    allergen: String,
    #[ts(optional)]
    reaction: Option<String>,
    severity: String,
}

impl AllergyRequest {
    fn into_params(self) -> Result<AllergyParams, AppError> {
        validate_string_length(&self.allergen, 1, MAX_NAME_LENGTH, "allergen")?;
        validate_optional_length(self.reaction.as_deref(), MAX_TEXT_LENGTH, "reaction")?;
        let severity = self.severity.trim().to_lowercase();
        if !ALLERGY_SEVERITIES.contains(&severity.as_str()) {
            return Err(AppError::BadRequest(format!(
                "severity must be one of {}",
                ALLERGY_SEVERITIES.join(", ")
            )));
        }
        Ok(AllergyParams {
            allergen: self.allergen.trim().to_string(),
            reaction: self.reaction,
            severity,
        })
    }
}

/// GET /api/patients/{id}/allergies
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<AllergyRow>>, AppError> {
    load_patient(&state, &user, patient_id).await?;
    let allergies = medrecords_db::allergies::list_for_patient(&state.pool, patient_id).await?;
    Ok(Json(allergies))
}

/// POST /api/patients/{id}/allergies
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(patient_id): Path<i64>,
    Json(body): Json<AllergyRequest>,
) -> Result<(StatusCode, Json<AllergyRow>), AppError> {
    user.require_staff()?;
    let params = body.into_params()?;
    load_patient(&state, &user, patient_id).await?;
    let allergy = medrecords_db::allergies::create(&state.pool, patient_id, &params).await?;
    info!(allergy_id = allergy.id, patient_id, "Recorded allergy");
    Ok((StatusCode::CREATED, Json(allergy)))
}

/// DELETE /api/allergies/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_staff()?;
    if !medrecords_db::allergies::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Allergy not found".into()));
    }
    info!(allergy_id = id, "Deleted allergy");
    Ok(Json(json!({ "success": true })))
}
