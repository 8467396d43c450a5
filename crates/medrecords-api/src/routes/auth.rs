use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use ts_rs::TS;

use crate::auth::{self, AuthUser};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// POST /api/auth/login
/// Verifies the password, opens a session and sets the session cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    }

    let account = medrecords_db::accounts::get_by_email(&state.pool, email).await?;

    // Same response for unknown email and wrong password
    let stored_hash = account.as_ref().map(|a| a.password_hash.clone());
    let verified = auth::verify_login(body.password, stored_hash).await?;
    let account = match account {
        Some(a) if verified => a,
        _ => {
            warn!(email = %email, "Failed login attempt");
            return Err(AppError::Unauthorized);
        }
    };

    let token = auth::new_session_token();
    let expires_at = Utc::now() + state.session_ttl;
    medrecords_db::accounts::create_session(&state.pool, &token, account.id, expires_at).await?;

    info!(account_id = account.id, role = %account.role, "Login");

    let cookie = auth::session_cookie(
        &token,
        state.session_ttl.num_seconds(),
        state.cookie_secure,
    );
    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({
            "user": {
                "id": account.id,
                "email": account.email,
                "role": account.role,
                "staffId": account.staff_id,
                "patientId": account.patient_id,
            }
        })),
    )
        .into_response())
}

/// POST /api/auth/logout
/// Deletes the session (if any) and clears the cookie.
pub async fn logout(
    State(state): State<AppState>,
    cookies: CookieJar,
) -> Result<Response, AppError> {
    if let Some(token) = auth::session_token(&cookies) {
        medrecords_db::accounts::delete_session(&state.pool, &token).await?;
        info!("Logout");
    }

    Ok((
        [(SET_COOKIE, auth::clear_session_cookie())],
        Json(json!({ "success": true })),
    )
        .into_response())
}

/// GET /api/auth/me
pub async fn me(user: AuthUser) -> Json<Value> {
    Json(json!({
        "user": {
            "id": user.account_id,
            "email": user.email,
            "role": user.role,
            "staffId": user.staff_id,
            "patientId": user.patient_id,
        }
    }))
}
