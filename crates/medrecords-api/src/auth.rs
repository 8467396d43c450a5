use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use medrecords_db::types::{Role, SessionAccountRow};
use sqlx::postgres::PgPool;
use tokio::sync::OnceCell;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Roles allowed to read clinical data for any patient
pub const STAFF_ROLES: &[Role] = &[Role::Admin, Role::Doctor, Role::Nurse];

/// Roles allowed to author health records and their children
pub const CLINICIAN_ROLES: &[Role] = &[Role::Admin, Role::Doctor];

/// Account information extracted from the session
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account_id: i64,
    pub email: String,
    pub role: Role,
    pub staff_id: Option<i64>,
    pub patient_id: Option<i64>,
}

/// Axum extractor that validates the session cookie and returns an [`AuthUser`].
///
/// ```ignore
/// async fn my_handler(user: AuthUser, ...) -> Result<..., AppError> { ... }
/// ```
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized)?;
        require_auth(&state.pool, &cookies).await
    }
}

/// Extract the session token from the cookie jar
pub fn session_token(cookies: &CookieJar) -> Option<String> {
    cookies
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolve the session cookie to a live account
pub async fn require_auth(pool: &PgPool, cookies: &CookieJar) -> Result<AuthUser, AppError> {
    let token = session_token(cookies).ok_or(AppError::Unauthorized)?;

    let row = medrecords_db::accounts::get_session_account(pool, &token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    AuthUser::try_from(row)
}

impl TryFrom<SessionAccountRow> for AuthUser {
    type Error = AppError;

    fn try_from(row: SessionAccountRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| {
            AppError::Internal(format!(
                "account {} has unknown role {:?}",
                row.account_id, row.role
            ))
        })?;
        Ok(Self {
            account_id: row.account_id,
            email: row.email,
            role,
            staff_id: row.staff_id,
            patient_id: row.patient_id,
        })
    }
}

impl AuthUser {
    /// Fail with 403 unless the account holds one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role '{}' is not allowed to perform this action",
                self.role.as_str()
            )))
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        self.require_role(STAFF_ROLES)
    }

    pub fn require_clinician(&self) -> Result<(), AppError> {
        self.require_role(CLINICIAN_ROLES)
    }

    /// Staff can see every patient; a patient only sees their own data
    pub fn can_access_patient(&self, patient_id: i64) -> bool {
        self.role.is_staff() || self.patient_id == Some(patient_id)
    }

    pub fn require_patient_access(&self, patient_id: i64) -> Result<(), AppError> {
        if self.can_access_patient(patient_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Not allowed to access this patient".into(),
            ))
        }
    }
}

/// Hash a password off the async runtime
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("hash task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

/// Check a password against a stored bcrypt hash off the async runtime.
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(format!("verify task failed: {e}")))
}

/// Hash that unknown emails are checked against, built on first use
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Check a login attempt. An unknown account still pays for one bcrypt
/// verification so response time does not reveal which emails exist.
pub async fn verify_login(password: String, stored_hash: Option<String>) -> Result<bool, AppError> {
    match stored_hash {
        Some(hash) => verify_password(password, hash).await,
        None => {
            let dummy = DUMMY_HASH
                .get_or_try_init(|| hash_password("unknown-account".into()))
                .await?
                .clone();
            verify_password(password, dummy).await?;
            Ok(false)
        }
    }
}

/// Fresh opaque session token
pub fn new_session_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// `Set-Cookie` value for a new session
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the session
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}
