use crate::types::{AllergyParams, AllergyRow};
use sqlx::PgPool;

const COLUMNS: &str = "id, patient_id, allergen, reaction, severity";

pub async fn list_for_patient(
    pool: &PgPool,
    patient_id: i64,
) -> Result<Vec<AllergyRow>, sqlx::Error> {
    sqlx::query_as::<_, AllergyRow>(&format!(
        "SELECT {COLUMNS} FROM allergies WHERE patient_id = $1 ORDER BY allergen ASC"
    ))
    .bind(patient_id)
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<AllergyRow>, sqlx::Error> {
    sqlx::query_as::<_, AllergyRow>(&format!("SELECT {COLUMNS} FROM allergies WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    patient_id: i64,
    p: &AllergyParams,
) -> Result<AllergyRow, sqlx::Error> {
    sqlx::query_as::<_, AllergyRow>(&format!(
        r#"
        INSERT INTO allergies (patient_id, allergen, reaction, severity)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(patient_id)
    .bind(&p.allergen)
    .bind(&p.reaction)
    .bind(&p.severity)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM allergies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
