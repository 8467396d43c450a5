use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use medrecords_db::types::{EmergencyContactParams, EmergencyContactRow};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;

use crate::auth::AuthUser;
use crate::constants::MAX_NAME_LENGTH;
use crate::error::AppError;
use crate::routes::patients::load_patient;
use crate::state::AppState;
use crate::validation::{validate_email, validate_string_length};

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EmergencyContactRequest {
    name: String,
    relationship: String,
    phone: String,
    #[ts(optional)]
    email: Option<String>,
}

impl EmergencyContactRequest {
    fn into_params(self) -> Result<EmergencyContactParams, AppError> {
        validate_string_length(&self.name, 1, MAX_NAME_LENGTH, "name")?;
        validate_string_length(&self.relationship, 1, 100, "relationship")?;
        validate_string_length(&self.phone, 1, 50, "phone")?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(EmergencyContactParams {
            name: self.name.trim().to_string(),
            relationship: self.relationship.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.map(|e| e.trim().to_string()),
        })
    }
}

/// GET /api/patients/{id}/emergency-contacts
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<EmergencyContactRow>>, AppError> {
    load_patient(&state, &user, patient_id).await?;
    let contacts =
        medrecords_db::emergency_contacts::list_for_patient(&state.pool, patient_id).await?;
    Ok(Json(contacts))
}

/// POST /api/patients/{id}/emergency-contacts
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(patient_id): Path<i64>,
    Json(body): Json<EmergencyContactRequest>,
) -> Result<(StatusCode, Json<EmergencyContactRow>), AppError> {
    user.require_staff()?;
    let params = body.into_params()?;
    load_patient(&state, &user, patient_id).await?;
    let contact =
        medrecords_db::emergency_contacts::create(&state.pool, patient_id, &params).await?;
    info!(contact_id = contact.id, patient_id, "Added emergency contact");
    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/emergency-contacts/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<EmergencyContactRequest>,
) -> Result<Json<EmergencyContactRow>, AppError> {
    user.require_staff()?;
    let params = body.into_params()?;
    medrecords_db::emergency_contacts::update(&state.pool, id, &params)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Emergency contact not found".into()))
}

/// DELETE /api/emergency-contacts/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_staff()?;
    if !medrecords_db::emergency_contacts::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Emergency contact not found".into()));
    }
    info!(contact_id = id, "Deleted emergency contact");
    Ok(Json(json!({ "success": true })))
}
