use std::time::Duration;

use access_url_cache::{CacheError, MemoryUrlCache, UrlCache};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::config::UrlCacheKind;

/// PostgreSQL-backed URL cache shared by every API instance.
pub struct PgUrlCache {
    pool: PgPool,
}

impl PgUrlCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlCache for PgUrlCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        medrecords_db::url_cache::get(&self.pool, key, Utc::now())
            .await
            .map_err(|e| CacheError::with_source("url cache read failed", e))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = expiry(Utc::now(), ttl)?;
        medrecords_db::url_cache::set(&self.pool, key, value, expires_at)
            .await
            .map_err(|e| CacheError::with_source("url cache write failed", e))
    }
}

/// Absolute row expiry, on the same clock that stamps the signed URLs
fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, CacheError> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| CacheError::new("url cache ttl out of range"))
}

/// Cache backend picked at startup from `URL_CACHE_BACKEND`
pub enum UrlCacheBackend {
    Postgres(PgUrlCache),
    Memory(MemoryUrlCache),
}

impl UrlCacheBackend {
    pub fn from_kind(kind: UrlCacheKind, pool: PgPool) -> Self {
        match kind {
            UrlCacheKind::Postgres => Self::Postgres(PgUrlCache::new(pool)),
            UrlCacheKind::Memory => Self::Memory(MemoryUrlCache::default()),
        }
    }
}

#[async_trait]
impl UrlCache for UrlCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            Self::Postgres(c) => c.get(key).await,
            Self::Memory(c) => c.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        match self {
            Self::Postgres(c) => c.set(key, value, ttl).await,
            Self::Memory(c) => c.set(key, value, ttl).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://localhost:1/unreachable")
            .unwrap()
    }

    #[tokio::test]
    async fn test_memory_backend_delegates() {
        let cache = UrlCacheBackend::from_kind(UrlCacheKind::Memory, lazy_pool());
        cache
            .set("k", "https://blob/x?sig=1", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            cache.get("k").await.unwrap().as_deref(),
            Some("https://blob/x?sig=1")
        );
    }

    #[test]
    fn test_expiry_uses_caller_clock() {
        let now = Utc::now();
        assert_eq!(
            expiry(now, Duration::from_secs(3540)).unwrap(),
            now + chrono::Duration::seconds(3540)
        );
        assert!(expiry(now, Duration::MAX).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_database_is_cache_error() {
        let cache = UrlCacheBackend::from_kind(UrlCacheKind::Postgres, lazy_pool());
        assert!(cache.get("k").await.is_err());
        assert!(cache.set("k", "v", Duration::from_secs(60)).await.is_err());
    }
}
