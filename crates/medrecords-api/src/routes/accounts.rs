use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use medrecords_db::types::{CreateAccountParams, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;

use crate::auth::{self, AuthUser};
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{validate_email, validate_password};

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CreateAccountRequest {
    email: String,
    password: String,
    role: Role,
    #[ts(optional)]
    staff_id: Option<i64>,
    #[ts(optional)]
    patient_id: Option<i64>,
}

/// A patient login must point at its patient row; staff logins must not.
fn check_links(body: &CreateAccountRequest) -> Result<(), AppError> {
    match body.role {
        Role::Patient if body.patient_id.is_none() => Err(AppError::BadRequest(
            "patientId is required for patient accounts".into(),
        )),
        Role::Patient if body.staff_id.is_some() => Err(AppError::BadRequest(
            "Patient accounts cannot be linked to staff".into(),
        )),
        Role::Admin | Role::Doctor | Role::Nurse if body.patient_id.is_some() => Err(
            AppError::BadRequest("Staff accounts cannot be linked to a patient".into()),
        ),
        _ => Ok(()),
    }
}

/// POST /api/accounts
pub async fn create_account(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    user.require_role(&[Role::Admin])?;

    validate_email(&body.email)?;
    validate_password(&body.password)?;
    check_links(&body)?;

    if medrecords_db::accounts::get_by_email(&state.pool, body.email.trim())
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "An account with this email already exists".into(),
        ));
    }

    let password_hash = auth::hash_password(body.password).await?;
    let account = medrecords_db::accounts::create(
        &state.pool,
        &CreateAccountParams {
            email: body.email.trim().to_string(),
            password_hash,
            role: body.role,
            staff_id: body.staff_id,
            patient_id: body.patient_id,
        },
    )
    .await?;

    info!(
        account_id = account.id,
        role = %account.role,
        created_by = user.account_id,
        "Created account"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": account.id,
            "email": account.email,
            "role": account.role,
            "staffId": account.staff_id,
            "patientId": account.patient_id,
            "createdAt": account.created_at,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(role: Role, staff_id: Option<i64>, patient_id: Option<i64>) -> CreateAccountRequest {
        CreateAccountRequest {
            email: "a@example.org".into(),
            password: "longenough".into(),
            role,
            staff_id,
            patient_id,
        }
    }

    #[test]
    fn test_account_links() {
        assert!(check_links(&request(Role::Patient, None, Some(1))).is_ok());
        assert!(check_links(&request(Role::Patient, None, None)).is_err());
        assert!(check_links(&request(Role::Patient, Some(2), Some(1))).is_err());
        assert!(check_links(&request(Role::Doctor, Some(2), None)).is_ok());
        assert!(check_links(&request(Role::Admin, None, None)).is_ok());
        assert!(check_links(&request(Role::Nurse, None, Some(1))).is_err());
    }
}
