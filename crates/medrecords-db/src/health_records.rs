use crate::types::{HealthRecordParams, HealthRecordRow};
use sqlx::PgPool;

const COLUMNS: &str = r#"
    id, patient_id, doctor_account_id, hospital_id, title, diagnosis, notes,
    visit_date, created_at, updated_at
"#;

/// All records of a patient, most recent visit first
pub async fn list_for_patient(
    pool: &PgPool,
    patient_id: i64,
) -> Result<Vec<HealthRecordRow>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecordRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM health_records
        WHERE patient_id = $1
        ORDER BY visit_date DESC, id DESC
        "#
    ))
    .bind(patient_id)
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<HealthRecordRow>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecordRow>(&format!(
        "SELECT {COLUMNS} FROM health_records WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Create a record attributed to the attending doctor's account
pub async fn create(
    pool: &PgPool,
    doctor_account_id: i64,
    p: &HealthRecordParams,
) -> Result<HealthRecordRow, sqlx::Error> {
    sqlx::query_as::<_, HealthRecordRow>(&format!(
        r#"
        INSERT INTO health_records (
            patient_id, doctor_account_id, hospital_id, title, diagnosis, notes, visit_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(p.patient_id)
    .bind(doctor_account_id)
    .bind(p.hospital_id)
    .bind(&p.title)
    .bind(&p.diagnosis)
    .bind(&p.notes)
    .bind(p.visit_date)
    .fetch_one(pool)
    .await
}

/// Update a record's clinical fields; the patient and doctor never change
pub async fn update(
    pool: &PgPool,
    id: i64,
    p: &HealthRecordParams,
) -> Result<Option<HealthRecordRow>, sqlx::Error> {
    sqlx::query_as::<_, HealthRecordRow>(&format!(
        r#"
        UPDATE health_records SET
            hospital_id = $2,
            title = $3,
            diagnosis = $4,
            notes = $5,
            visit_date = $6,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(p.hospital_id)
    .bind(&p.title)
    .bind(&p.diagnosis)
    .bind(&p.notes)
    .bind(p.visit_date)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM health_records WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
