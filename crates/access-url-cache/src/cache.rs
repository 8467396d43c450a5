//! Cache seam for signed URLs

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use crate::error::CacheError;

/// Shared string-keyed cache with per-entry absolute expiration.
///
/// Implementations must be safe to call concurrently, and for a distributed
/// backend, from several processes at once.
#[async_trait]
pub trait UrlCache: Send + Sync {
    /// Look up a live entry; expired entries read as `None`
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Insert or overwrite an entry that expires `ttl` from now
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct CachedUrl {
    url: String,
    ttl: Duration,
}

/// Expires every entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, CachedUrl> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedUrl,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process [`UrlCache`] backed by moka.
///
/// Only shared between tasks of one process; use a database-backed cache
/// when several API instances run side by side.
pub struct MemoryUrlCache {
    entries: Cache<String, CachedUrl>,
}

impl MemoryUrlCache {
    pub fn new(max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { entries }
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

impl Default for MemoryUrlCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl UrlCache for MemoryUrlCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|entry| entry.url))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .insert(
                key.to_string(),
                CachedUrl {
                    url: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }
}
