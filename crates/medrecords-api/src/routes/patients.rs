use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use medrecords_db::types::{Page, PageRequest, PatientParams, PatientRow, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;

use crate::auth::AuthUser;
use crate::constants::MAX_NAME_LENGTH;
use crate::error::AppError;
use crate::routes::files::remove_blobs;
use crate::state::AppState;
use crate::validation::{validate_email, validate_optional_length, validate_string_length};

const BLOOD_TYPES: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientListParams {
    page: Option<i64>,
    page_size: Option<i64>,
    search: Option<String>,
}

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PatientRequest {
    first_name: String,
    last_name: String,
    date_of_birth: NaiveDate,
    #[ts(optional)]
    gender: Option<String>,
    #[ts(optional)]
    email: Option<String>,
    #[ts(optional)]
    phone: Option<String>,
    #[ts(optional)]
    address: Option<String>,
    #[ts(optional)]
    blood_type: Option<String>,
}

impl PatientRequest {
    fn into_params(self) -> Result<PatientParams, AppError> {
        validate_string_length(&self.first_name, 1, MAX_NAME_LENGTH, "firstName")?;
        validate_string_length(&self.last_name, 1, MAX_NAME_LENGTH, "lastName")?;
        if self.date_of_birth > Utc::now().date_naive() {
            return Err(AppError::BadRequest(
                "dateOfBirth cannot be in the future".into(),
            ));
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(bt) = &self.blood_type {
            if !BLOOD_TYPES.contains(&bt.as_str()) {
                return Err(AppError::BadRequest(format!(
                    "bloodType must be one of {}",
                    BLOOD_TYPES.join(", ")
                )));
            }
        }
        validate_optional_length(self.gender.as_deref(), 50, "gender")?;
        validate_optional_length(self.phone.as_deref(), 50, "phone")?;
        validate_optional_length(self.address.as_deref(), MAX_NAME_LENGTH, "address")?;
        Ok(PatientParams {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            email: self.email.map(|e| e.trim().to_string()),
            phone: self.phone,
            address: self.address,
            blood_type: self.blood_type,
        })
    }
}

/// GET /api/patients?page=&pageSize=&search=
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PatientListParams>,
) -> Result<Json<Page<PatientRow>>, AppError> {
    user.require_staff()?;
    let request = PageRequest::new(params.page, params.page_size);
    let page =
        medrecords_db::patients::list_page(&state.pool, params.search.as_deref(), request).await?;
    Ok(Json(page))
}

/// Load a patient the caller is allowed to see
pub(crate) async fn load_patient(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> Result<PatientRow, AppError> {
    // Check access first so patients cannot probe which ids exist
    user.require_patient_access(id)?;
    medrecords_db::patients::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Patient not found".into()))
}

/// GET /api/patients/{id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PatientRow>, AppError> {
    Ok(Json(load_patient(&state, &user, id).await?))
}

/// POST /api/patients
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<PatientRequest>,
) -> Result<(StatusCode, Json<PatientRow>), AppError> {
    user.require_staff()?;
    let params = body.into_params()?;
    let patient = medrecords_db::patients::create(&state.pool, &params).await?;
    info!(patient_id = patient.id, created_by = user.account_id, "Created patient");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// PUT /api/patients/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<PatientRequest>,
) -> Result<Json<PatientRow>, AppError> {
    user.require_staff()?;
    let params = body.into_params()?;
    medrecords_db::patients::update(&state.pool, id, &params)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Patient not found".into()))
}

/// DELETE /api/patients/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_role(&[Role::Admin])?;

    // Records and file rows cascade; the blobs have to be removed by hand
    let records = medrecords_db::health_records::list_for_patient(&state.pool, id).await?;
    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    let files = medrecords_db::files::list_for_records(&state.pool, &ids).await?;

    if !medrecords_db::patients::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Patient not found".into()));
    }
    let file_count = files.len();
    remove_blobs(&state, files.into_iter().map(|f| f.blob_name).collect()).await;

    info!(
        patient_id = id,
        files = file_count,
        deleted_by = user.account_id,
        "Deleted patient"
    );
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PatientRequest {
        PatientRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            gender: None,
            email: Some(" ada@example.org ".into()),
            phone: None,
            address: None,
            blood_type: Some("AB-".into()),
        }
    }

    #[test]
    fn test_valid_patient() {
        let params = request().into_params().unwrap();
        assert_eq!(params.email.as_deref(), Some("ada@example.org"));
    }

    #[test]
    fn test_rejects_unknown_blood_type() {
        let mut req = request();
        req.blood_type = Some("C+".into());
        assert!(req.into_params().is_err());
    }

    #[test]
    fn test_rejects_future_birth_date() {
        let mut req = request();
        req.date_of_birth = Utc::now().date_naive() + chrono::Days::new(1);
        assert!(req.into_params().is_err());
    }

    #[test]
    fn test_rejects_blank_name() {
        let mut req = request();
        req.last_name = "  ".into();
        assert!(req.into_params().is_err());
    }
}
