use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use medrecords_db::types::{Page, PageRequest, Role, StaffParams, StaffRow};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;

use crate::auth::AuthUser;
use crate::constants::MAX_NAME_LENGTH;
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{validate_email, validate_optional_length, validate_string_length};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffListParams {
    page: Option<i64>,
    page_size: Option<i64>,
    hospital_id: Option<i64>,
}

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StaffRequest {
    #[ts(optional)]
    hospital_id: Option<i64>,
    first_name: String,
    last_name: String,
    email: String,
    #[ts(optional)]
    phone: Option<String>,
    #[ts(optional)]
    specialization: Option<String>,
    position: String,
}

impl StaffRequest {
    fn into_params(self) -> Result<StaffParams, AppError> {
        validate_string_length(&self.first_name, 1, MAX_NAME_LENGTH, "firstName")?;
        validate_string_length(&self.last_name, 1, MAX_NAME_LENGTH, "lastName")?;
        validate_email(&self.email)?;
        validate_string_length(&self.position, 1, MAX_NAME_LENGTH, "position")?;
        validate_optional_length(self.phone.as_deref(), 50, "phone")?;
        validate_optional_length(
            self.specialization.as_deref(),
            MAX_NAME_LENGTH,
            "specialization",
        )?;
        Ok(StaffParams {
            hospital_id: self.hospital_id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone,
            specialization: self.specialization,
            position: self.position.trim().to_string(),
        })
    }
}

/// GET /api/staff?page=&pageSize=&hospitalId=
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<StaffListParams>,
) -> Result<Json<Page<StaffRow>>, AppError> {
    user.require_staff()?;
    let request = PageRequest::new(params.page, params.page_size);
    let page = medrecords_db::staff::list_page(&state.pool, params.hospital_id, request).await?;
    Ok(Json(page))
}

/// GET /api/staff/{id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<StaffRow>, AppError> {
    user.require_staff()?;
    medrecords_db::staff::get(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Staff member not found".into()))
}

/// POST /api/staff
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<StaffRequest>,
) -> Result<(StatusCode, Json<StaffRow>), AppError> {
    user.require_role(&[Role::Admin])?;
    let params = body.into_params()?;
    let staff = medrecords_db::staff::create(&state.pool, &params).await?;
    info!(staff_id = staff.id, "Created staff member");
    Ok((StatusCode::CREATED, Json(staff)))
}

/// PUT /api/staff/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<StaffRequest>,
) -> Result<Json<StaffRow>, AppError> {
    user.require_role(&[Role::Admin])?;
    let params = body.into_params()?;
    medrecords_db::staff::update(&state.pool, id, &params)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Staff member not found".into()))
}

/// DELETE /api/staff/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_role(&[Role::Admin])?;
    if !medrecords_db::staff::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Staff member not found".into()));
    }
    info!(staff_id = id, "Deleted staff member");
    Ok(Json(json!({ "success": true })))
}
