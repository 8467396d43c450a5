use crate::like_pattern;
use crate::types::{Page, PageRequest, PatientParams, PatientRow};
use sqlx::PgPool;

const COLUMNS: &str = r#"
    id, first_name, last_name, date_of_birth, gender, email, phone,
    address, blood_type, created_at
"#;

const SEARCH_FILTER: &str = r#"
    ($1::text IS NULL
        OR first_name ILIKE $1
        OR last_name ILIKE $1
        OR email ILIKE $1)
"#;

/// One page of patients ordered by name.
///
/// `search` matches case-insensitively against first name, last name or email.
pub async fn list_page(
    pool: &PgPool,
    search: Option<&str>,
    request: PageRequest,
) -> Result<Page<PatientRow>, sqlx::Error> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);

    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM patients WHERE {SEARCH_FILTER}"
    ))
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM patients
        WHERE {SEARCH_FILTER}
        ORDER BY last_name ASC, first_name ASC, id ASC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(&pattern)
    .bind(request.page_size)
    .bind(request.offset())
    .fetch_all(pool)
    .await?;

    Ok(Page::new(rows, request, total))
}

pub async fn get(pool: &PgPool, id: i64) -> Result<Option<PatientRow>, sqlx::Error> {
    sqlx::query_as::<_, PatientRow>(&format!("SELECT {COLUMNS} FROM patients WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, p: &PatientParams) -> Result<PatientRow, sqlx::Error> {
    sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        INSERT INTO patients (
            first_name, last_name, date_of_birth, gender, email, phone, address, blood_type
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&p.first_name)
    .bind(&p.last_name)
    .bind(p.date_of_birth)
    .bind(&p.gender)
    .bind(&p.email)
    .bind(&p.phone)
    .bind(&p.address)
    .bind(&p.blood_type)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    p: &PatientParams,
) -> Result<Option<PatientRow>, sqlx::Error> {
    sqlx::query_as::<_, PatientRow>(&format!(
        r#"
        UPDATE patients SET
            first_name = $2,
            last_name = $3,
            date_of_birth = $4,
            gender = $5,
            email = $6,
            phone = $7,
            address = $8,
            blood_type = $9
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&p.first_name)
    .bind(&p.last_name)
    .bind(p.date_of_birth)
    .bind(&p.gender)
    .bind(&p.email)
    .bind(&p.phone)
    .bind(&p.address)
    .bind(&p.blood_type)
    .fetch_optional(pool)
    .await
}

/// Delete a patient; their records, allergies and contacts cascade
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM patients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
