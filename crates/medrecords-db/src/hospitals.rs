use crate::types::{HospitalParams, HospitalRow};
use sqlx::PgPool;

const COLUMNS: &str = "id, name, address, city, phone, created_at";

/// List all hospitals by name
pub async fn list(pool: &PgPool) -> Result<Vec<HospitalRow>, sqlx::Error> {
    sqlx::query_as::<_, HospitalRow>(&format!(
        "SELECT {COLUMNS} FROM hospitals ORDER BY name ASC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<HospitalRow>, sqlx::Error> {
    sqlx::query_as::<_, HospitalRow>(&format!("SELECT {COLUMNS} FROM hospitals WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, p: &HospitalParams) -> Result<HospitalRow, sqlx::Error> {
    sqlx::query_as::<_, HospitalRow>(&format!(
        r#"
        INSERT INTO hospitals (name, address, city, phone)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&p.name)
    .bind(&p.address)
    .bind(&p.city)
    .bind(&p.phone)
    .fetch_one(pool)
    .await
}

/// Replace a hospital's fields, returning `None` if it does not exist
pub async fn update(
    pool: &PgPool,
    id: i64,
    p: &HospitalParams,
) -> Result<Option<HospitalRow>, sqlx::Error> {
    sqlx::query_as::<_, HospitalRow>(&format!(
        r#"
        UPDATE hospitals
        SET name = $2, address = $3, city = $4, phone = $5
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&p.name)
    .bind(&p.address)
    .bind(&p.city)
    .bind(&p.phone)
    .fetch_optional(pool)
    .await
}

/// Delete a hospital, returning whether a row was removed
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM hospitals WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
