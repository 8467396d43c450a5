use crate::types::{ProcedureParams, ProcedureRow};
use sqlx::PgPool;

const COLUMNS: &str = "id, health_record_id, name, description, performed_at, outcome";

pub async fn list_for_record(
    pool: &PgPool,
    health_record_id: i64,
) -> Result<Vec<ProcedureRow>, sqlx::Error> {
    sqlx::query_as::<_, ProcedureRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM procedures
        WHERE health_record_id = $1
        ORDER BY performed_at DESC, id ASC
        "#
    ))
    .bind(health_record_id)
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<ProcedureRow>, sqlx::Error> {
    sqlx::query_as::<_, ProcedureRow>(&format!("SELECT {COLUMNS} FROM procedures WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    health_record_id: i64,
    p: &ProcedureParams,
) -> Result<ProcedureRow, sqlx::Error> {
    sqlx::query_as::<_, ProcedureRow>(&format!(
        r#"
        INSERT INTO procedures (health_record_id, name, description, performed_at, outcome)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(health_record_id)
    .bind(&p.name)
    .bind(&p.description)
    .bind(p.performed_at)
    .bind(&p.outcome)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM procedures WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
