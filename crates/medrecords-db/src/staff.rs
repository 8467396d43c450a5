use crate::types::{Page, PageRequest, StaffParams, StaffRow};
use sqlx::PgPool;

const COLUMNS: &str =
    "id, hospital_id, first_name, last_name, email, phone, specialization, position, created_at";

/// One page of staff ordered by name, optionally limited to one hospital
pub async fn list_page(
    pool: &PgPool,
    hospital_id: Option<i64>,
    request: PageRequest,
) -> Result<Page<StaffRow>, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM staff WHERE ($1::bigint IS NULL OR hospital_id = $1)",
    )
    .bind(hospital_id)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, StaffRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM staff
        WHERE ($1::bigint IS NULL OR hospital_id = $1)
        ORDER BY last_name ASC, first_name ASC, id ASC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(hospital_id)
    .bind(request.page_size)
    .bind(request.offset())
    .fetch_all(pool)
    .await?;

    Ok(Page::new(rows, request, total))
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<StaffRow>, sqlx::Error> {
    sqlx::query_as::<_, StaffRow>(&format!("SELECT {COLUMNS} FROM staff WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, p: &StaffParams) -> Result<StaffRow, sqlx::Error> {
    sqlx::query_as::<_, StaffRow>(&format!(
        r#"
        INSERT INTO staff (
            hospital_id, first_name, last_name, email, phone, specialization, position
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(p.hospital_id)
    .bind(&p.first_name)
    .bind(&p.last_name)
    .bind(&p.email)
    .bind(&p.phone)
    .bind(&p.specialization)
    .bind(&p.position)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    p: &StaffParams,
) -> Result<Option<StaffRow>, sqlx::Error> {
    sqlx::query_as::<_, StaffRow>(&format!(
        r#"
        UPDATE staff SET
            hospital_id = $2,
            first_name = $3,
            last_name = $4,
            email = $5,
            phone = $6,
            specialization = $7,
            position = $8
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(p.hospital_id)
    .bind(&p.first_name)
    .bind(&p.last_name)
    .bind(&p.email)
    .bind(&p.phone)
    .bind(&p.specialization)
    .bind(&p.position)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM staff WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
