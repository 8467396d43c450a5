use crate::types::{CreateFileParams, HealthRecordFileRow};
use sqlx::PgPool;

const COLUMNS: &str = r#"
    id, health_record_id, file_name, content_type, blob_name, size_bytes,
    uploaded_by, created_at
"#;

/// Get all attachments of a health record, oldest first
pub async fn list_for_record(
    pool: &PgPool,
    health_record_id: i64,
) -> Result<Vec<HealthRecordFileRow>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecordFileRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM health_record_files
        WHERE health_record_id = $1
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(health_record_id)
    .fetch_all(pool)
    .await
}

/// Get attachments for multiple health records (batch)
pub async fn list_for_records(
    pool: &PgPool,
    health_record_ids: &[i64],
) -> Result<Vec<HealthRecordFileRow>, sqlx::Error> {
    if health_record_ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, HealthRecordFileRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM health_record_files
        WHERE health_record_id = ANY($1)
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(health_record_ids)
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<HealthRecordFileRow>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecordFileRow>(&format!(
        "SELECT {COLUMNS} FROM health_record_files WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    p: &CreateFileParams,
) -> Result<HealthRecordFileRow, sqlx::Error> {
    sqlx::query_as::<_, HealthRecordFileRow>(&format!(
        r#"
        INSERT INTO health_record_files (
            health_record_id, file_name, content_type, blob_name, size_bytes, uploaded_by
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(p.health_record_id)
    .bind(&p.file_name)
    .bind(&p.content_type)
    .bind(&p.blob_name)
    .bind(p.size_bytes)
    .bind(p.uploaded_by)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM health_record_files WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
