use crate::types::{PrescriptionParams, PrescriptionRow};
use sqlx::PgPool;

const COLUMNS: &str =
    "id, health_record_id, medication, dosage, frequency, start_date, end_date, notes";

pub async fn list_for_record(
    pool: &PgPool,
    health_record_id: i64,
) -> Result<Vec<PrescriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, PrescriptionRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM prescriptions
        WHERE health_record_id = $1
        ORDER BY start_date DESC, id ASC
        "#
    ))
    .bind(health_record_id)
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<PrescriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, PrescriptionRow>(&format!(
        "SELECT {COLUMNS} FROM prescriptions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    health_record_id: i64,
    p: &PrescriptionParams,
) -> Result<PrescriptionRow, sqlx::Error> {
    sqlx::query_as::<_, PrescriptionRow>(&format!(
        r#"
        INSERT INTO prescriptions (
            health_record_id, medication, dosage, frequency, start_date, end_date, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(health_record_id)
    .bind(&p.medication)
    .bind(&p.dosage)
    .bind(&p.frequency)
    .bind(p.start_date)
    .bind(p.end_date)
    .bind(&p.notes)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM prescriptions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
