use crate::types::{AccountRow, CreateAccountParams, SessionAccountRow};
use chrono::{DateTime, Utc};

const COLUMNS: &str = "id, email, password_hash, role, staff_id, patient_id, created_at";

/// Find an account by login email (case-insensitive)
pub async fn get_by_email(
    executor: impl sqlx::PgExecutor<'_>,
    email: &str,
) -> Result<Option<AccountRow>, sqlx::Error> {
    sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {COLUMNS} FROM accounts WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email)
    .fetch_optional(executor)
    .await
}

pub async fn get(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<AccountRow>, sqlx::Error> {
    sqlx::query_as::<_, AccountRow>(&format!("SELECT {COLUMNS} FROM accounts WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    p: &CreateAccountParams,
) -> Result<AccountRow, sqlx::Error> {
    sqlx::query_as::<_, AccountRow>(&format!(
        r#"
        INSERT INTO accounts (email, password_hash, role, staff_id, patient_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&p.email)
    .bind(&p.password_hash)
    .bind(p.role.as_str())
    .bind(p.staff_id)
    .bind(p.patient_id)
    .fetch_one(executor)
    .await
}

// Sessions (cookie token -> account)

/// Store a session token valid until `expires_at`
pub async fn create_session(
    executor: impl sqlx::PgExecutor<'_>,
    token: &str,
    account_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO sessions (token, account_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(account_id)
        .bind(expires_at)
        .execute(executor)
        .await?;
    Ok(())
}

/// Resolve a session token to its account (only if not expired)
pub async fn get_session_account(
    executor: impl sqlx::PgExecutor<'_>,
    token: &str,
) -> Result<Option<SessionAccountRow>, sqlx::Error> {
    sqlx::query_as::<_, SessionAccountRow>(
        r#"
        SELECT a.id as account_id, a.email, a.role, a.staff_id, a.patient_id
        FROM sessions s
        JOIN accounts a ON a.id = s.account_id
        WHERE s.token = $1 AND s.expires_at > NOW()
        "#,
    )
    .bind(token)
    .fetch_optional(executor)
    .await
}

pub async fn delete_session(
    executor: impl sqlx::PgExecutor<'_>,
    token: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(executor)
        .await?;
    Ok(())
}

/// Clean up expired sessions
pub async fn cleanup_expired_sessions(
    executor: impl sqlx::PgExecutor<'_>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
