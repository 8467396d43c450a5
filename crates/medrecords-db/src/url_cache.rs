//! Table-backed key/value cache shared by every API instance
//!
//! Entries carry an absolute `expires_at`; reads ignore expired rows, so
//! expiry does not depend on the purge ever running. Callers pass `now` and
//! `expires_at` from their own clock so cached values expire on the same
//! clock that stamped them, not the database server's.

use chrono::{DateTime, Utc};

/// Get a cached value (only if not expired as of `now`)
pub async fn get(
    executor: impl sqlx::PgExecutor<'_>,
    key: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT url FROM access_url_cache WHERE cache_key = $1 AND expires_at > $2",
    )
    .bind(key)
    .bind(now)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| r.0))
}

/// Insert or overwrite a value that expires at `expires_at`
pub async fn set(
    executor: impl sqlx::PgExecutor<'_>,
    key: &str,
    value: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO access_url_cache (cache_key, url, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (cache_key) DO UPDATE SET
            url = EXCLUDED.url,
            expires_at = EXCLUDED.expires_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Delete rows expired as of `now`, returning how many were removed
pub async fn purge_expired(
    executor: impl sqlx::PgExecutor<'_>,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM access_url_cache WHERE expires_at <= $1")
        .bind(now)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::PgPool;

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL pointing at a scratch PostgreSQL server"]
    async fn test_get_set_and_expiry(pool: PgPool) -> sqlx::Result<()> {
        let now = Utc::now();

        assert_eq!(get(&pool, "5:files:a.png", now).await?, None);

        set(&pool, "5:files:a.png", "https://a/1", now + Duration::seconds(60)).await?;
        assert_eq!(
            get(&pool, "5:files:a.png", now).await?.as_deref(),
            Some("https://a/1")
        );

        // Upsert replaces both the value and the expiry
        set(&pool, "5:files:a.png", "https://a/2", now + Duration::seconds(120)).await?;
        assert_eq!(
            get(&pool, "5:files:a.png", now + Duration::seconds(90))
                .await?
                .as_deref(),
            Some("https://a/2")
        );

        // Expiry is judged against the caller's clock
        assert_eq!(
            get(&pool, "5:files:a.png", now + Duration::seconds(120)).await?,
            None
        );

        set(&pool, "5:files:b.png", "https://b", now - Duration::seconds(1)).await?;
        assert_eq!(purge_expired(&pool, now).await?, 1);
        assert_eq!(purge_expired(&pool, now + Duration::seconds(121)).await?, 1);
        Ok(())
    }
}
