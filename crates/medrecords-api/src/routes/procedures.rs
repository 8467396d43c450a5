use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use medrecords_db::types::{ProcedureParams, ProcedureRow};
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
pub struct ProcedureRequest {
    name: String,
    #[ts(optional)]
    description: Option<String>,
    performed_at: DateTime<Utc>,
    #[ts(optional)]
    outcome: Option<String>,
}

impl ProcedureRequest {
    fn into_params(self) -> Result<ProcedureParams, AppError> {
        validate_string_length(&self.name, 1, MAX_NAME_LENGTH, "name")?;
        validate_optional_length(self.description.as_deref(), MAX_TEXT_LENGTH, "description")?;
        validate_optional_length(self.outcome.as_deref(), MAX_TEXT_LENGTH, "outcome")?;
        Ok(ProcedureParams {
            name: self.name.trim().to_string(),
            description: self.description,
            performed_at: self.performed_at,
            outcome: self.outcome,
        })
    }
}

/// GET /api/health-records/{id}/procedures
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<i64>,
) -> Result<Json<Vec<ProcedureRow>>, AppError> {
    load_record(&state, &user, record_id).await?;
    let rows = medrecords_db::procedures::list_for_record(&state.pool, record_id).await?;
    Ok(Json(rows))
}

/// POST /api/health-records/{id}/procedures
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<i64>,
    Json(body): Json<ProcedureRequest>,
) -> Result<(StatusCode, Json<ProcedureRow>), AppError> {
    user.require_clinician()?;
    let params = body.into_params()?;
    load_record(&state, &user, record_id).await?;
    let row = medrecords_db::procedures::create(&state.pool, record_id, &params).await?;
    info!(procedure_id = row.id, record_id, "Added procedure");
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/procedures/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_clinician()?;
    if !medrecords_db::procedures::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Procedure not found".into()));
    }
    info!(procedure_id = id, "Deleted procedure");
    Ok(Json(json!({ "success": true })))
}
