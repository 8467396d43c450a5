use crate::types::{EmergencyContactParams, EmergencyContactRow};
use sqlx::PgPool;

const COLUMNS: &str = "id, patient_id, name, relationship, phone, email";

pub async fn list_for_patient(
    pool: &PgPool,
    patient_id: i64,
) -> Result<Vec<EmergencyContactRow>, sqlx::Error> {
    sqlx::query_as::<_, EmergencyContactRow>(&format!(
        "SELECT {COLUMNS} FROM emergency_contacts WHERE patient_id = $1 ORDER BY name ASC"
    ))
    .bind(patient_id)
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<EmergencyContactRow>, sqlx::Error> {
    sqlx::query_as::<_, EmergencyContactRow>(&format!(
        "SELECT {COLUMNS} FROM emergency_contacts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    patient_id: i64,
    p: &EmergencyContactParams,
) -> Result<EmergencyContactRow, sqlx::Error> {
    sqlx::query_as::<_, EmergencyContactRow>(&format!(
        r#"
        INSERT INTO emergency_contacts (patient_id, name, relationship, phone, email)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(patient_id)
    .bind(&p.name)
    .bind(&p.relationship)
    .bind(&p.phone)
    .bind(&p.email)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    p: &EmergencyContactParams,
) -> Result<Option<EmergencyContactRow>, sqlx::Error> {
    sqlx::query_as::<_, EmergencyContactRow>(&format!(
        r#"
        UPDATE emergency_contacts
        SET name = $2, relationship = $3, phone = $4, email = $5
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&p.name)
    .bind(&p.relationship)
    .bind(&p.phone)
    .bind(&p.email)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM emergency_contacts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
