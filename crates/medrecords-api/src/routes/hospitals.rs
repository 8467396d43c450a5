use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use medrecords_db::types::{HospitalParams, HospitalRow, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;

use crate::auth::AuthUser;
use crate::constants::MAX_NAME_LENGTH;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{validate_optional_length, validate_string_length};

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HospitalRequest {
    name: String,
    address: String,
    city: String,
    #[ts(optional)]
    phone: Option<String>,
}

impl HospitalRequest {
    fn into_params(self) -> Result<HospitalParams, AppError> {
        validate_string_length(&self.name, 1, MAX_NAME_LENGTH, "name")?;
        validate_string_length(&self.address, 1, MAX_NAME_LENGTH, "address")?;
        validate_string_length(&self.city, 1, MAX_NAME_LENGTH, "city")?;
        validate_optional_length(self.phone.as_deref(), 50, "phone")?;
        Ok(HospitalParams {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            phone: self.phone,
        })
    }
}

/// GET /api/hospitals
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<HospitalRow>>, AppError> {
    Ok(Json(medrecords_db::hospitals::list(&state.pool).await?))
}

/// GET /api/hospitals/{id}
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<HospitalRow>, AppError> {
    medrecords_db::hospitals::get(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Hospital not found".into()))
}

/// POST /api/hospitals
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<HospitalRequest>,
) -> Result<(StatusCode, Json<HospitalRow>), AppError> {
    user.require_role(&[Role::Admin])?;
    let params = body.into_params()?;
    let hospital = medrecords_db::hospitals::create(&state.pool, &params).await?;
    info!(hospital_id = hospital.id, "Created hospital");
    Ok((StatusCode::CREATED, Json(hospital)))
}

/// PUT /api/hospitals/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<HospitalRequest>,
) -> Result<Json<HospitalRow>, AppError> {
    user.require_role(&[Role::Admin])?;
    let params = body.into_params()?;
    medrecords_db::hospitals::update(&state.pool, id, &params)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Hospital not found".into()))
}

/// DELETE /api/hospitals/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_role(&[Role::Admin])?;
    if !medrecords_db::hospitals::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Hospital not found".into()));
    }
    info!(hospital_id = id, "Deleted hospital");
    Ok(Json(json!({ "success": true })))
}
