//! Read-through cache of signed blob URLs

use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::UrlCache;
use crate::config::{CacheFailurePolicy, TokenCacheConfig};
use crate::error::{Result, TokenCacheError};
use crate::key::CacheKey;
use crate::signer::ReadUrlSigner;

/// Hands out read-only blob URLs, minting only on a cache miss.
///
/// The service keeps no state of its own; everything lives in the shared
/// cache. Two callers missing on the same key at once will both mint and
/// both write, which is harmless since either URL is valid.
pub struct TokenCacheService<C, S> {
    cache: C,
    signer: S,
    config: TokenCacheConfig,
}

impl<C, S> TokenCacheService<C, S>
where
    C: UrlCache,
    S: ReadUrlSigner,
{
    pub fn new(cache: C, signer: S, config: TokenCacheConfig) -> Self {
        Self {
            cache,
            signer,
            config,
        }
    }

    pub fn config(&self) -> &TokenCacheConfig {
        &self.config
    }

    /// Return a valid read URL for `container_name/blob_name`, cached per
    /// `owner_id`.
    pub async fn get_access_url(
        &self,
        owner_id: &str,
        container_name: &str,
        blob_name: &str,
    ) -> Result<String> {
        validate_identifier("owner_id", owner_id)?;
        validate_identifier("container_name", container_name)?;
        validate_identifier("blob_name", blob_name)?;

        let key = CacheKey::new(owner_id, container_name, blob_name);

        if let Some(url) = self.cached(&key).await? {
            debug!(key = %key, "Access URL cache hit");
            return Ok(url);
        }

        let validity = chrono::Duration::from_std(self.config.validity())
            .map_err(|e| TokenCacheError::InvalidConfig(e.to_string()))?;
        let expires_at = Utc::now() + validity;
        let url = self
            .signer
            .mint_read_url(container_name, blob_name, expires_at)
            .await
            .map_err(TokenCacheError::StorageUnavailable)?;

        debug!(key = %key, expires_at = %expires_at, "Access URL cache miss, minted new URL");

        self.store(&key, &url).await?;
        Ok(url)
    }

    async fn cached(&self, key: &CacheKey) -> Result<Option<String>> {
        match self.cache.get(key.as_str()).await {
            Ok(value) => Ok(value.filter(|url| !url.is_empty())),
            Err(e) => match self.config.on_cache_failure() {
                CacheFailurePolicy::FailRequest => Err(TokenCacheError::CacheUnavailable(e)),
                CacheFailurePolicy::BypassCache => {
                    warn!(key = %key, error = %e, "URL cache read failed, minting fresh URL");
                    Ok(None)
                }
            },
        }
    }

    async fn store(&self, key: &CacheKey, url: &str) -> Result<()> {
        match self
            .cache
            .set(key.as_str(), url, self.config.cache_ttl())
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => match self.config.on_cache_failure() {
                CacheFailurePolicy::FailRequest => Err(TokenCacheError::CacheUnavailable(e)),
                CacheFailurePolicy::BypassCache => {
                    warn!(key = %key, error = %e, "URL cache write failed");
                    Ok(())
                }
            },
        }
    }
}

fn validate_identifier(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TokenCacheError::InvalidArgument(format!(
            "{name} must not be empty"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(TokenCacheError::InvalidArgument(format!(
            "{name} must not contain control characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryUrlCache;
    use crate::error::{CacheError, SignerError};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone)]
    struct MintCall {
        container: String,
        blob: String,
        expires_at: DateTime<Utc>,
    }

    /// Signer that numbers every URL it mints
    #[derive(Default, Clone)]
    struct CountingSigner {
        calls: Arc<Mutex<Vec<MintCall>>>,
        counter: Arc<AtomicUsize>,
    }

    impl CountingSigner {
        fn count(&self) -> usize {
            self.counter.load(Ordering::SeqCst)
        }

        fn calls(&self) -> Vec<MintCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReadUrlSigner for CountingSigner {
        async fn mint_read_url(
            &self,
            container: &str,
            blob: &str,
            expires_at: DateTime<Utc>,
        ) -> std::result::Result<String, SignerError> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            self.calls.lock().unwrap().push(MintCall {
                container: container.to_string(),
                blob: blob.to_string(),
                expires_at,
            });
            Ok(format!("https://store/{container}/{blob}?sp=r&sig=U{n}"))
        }
    }

    struct FailingSigner;

    #[async_trait]
    impl ReadUrlSigner for FailingSigner {
        async fn mint_read_url(
            &self,
            _container: &str,
            _blob: &str,
            _expires_at: DateTime<Utc>,
        ) -> std::result::Result<String, SignerError> {
            Err(SignerError::Unavailable("connection reset".to_string()))
        }
    }

    /// Cache that records every write, including its TTL
    #[derive(Default, Clone)]
    struct RecordingCache {
        entries: Arc<Mutex<HashMap<String, String>>>,
        writes: Arc<Mutex<Vec<(String, String, Duration)>>>,
    }

    impl RecordingCache {
        fn writes(&self) -> Vec<(String, String, Duration)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UrlCache for RecordingCache {
        async fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> std::result::Result<(), CacheError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            self.writes
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string(), ttl));
            Ok(())
        }
    }

    /// Cache whose entries have always already expired
    #[derive(Default)]
    struct AlwaysMissCache {
        sets: AtomicUsize,
    }

    #[async_trait]
    impl UrlCache for AlwaysMissCache {
        async fn get(&self, _key: &str) -> std::result::Result<Option<String>, CacheError> {
            Ok(None)
        }

        async fn set(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Duration,
        ) -> std::result::Result<(), CacheError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct UnreachableCache {
        fail_reads: bool,
        fail_writes: bool,
    }

    #[async_trait]
    impl UrlCache for UnreachableCache {
        async fn get(&self, _key: &str) -> std::result::Result<Option<String>, CacheError> {
            if self.fail_reads {
                Err(CacheError::new("cache read timed out"))
            } else {
                Ok(None)
            }
        }

        async fn set(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Duration,
        ) -> std::result::Result<(), CacheError> {
            if self.fail_writes {
                Err(CacheError::new("cache write timed out"))
            } else {
                Ok(())
            }
        }
    }

    fn service_with(
        cache: RecordingCache,
        signer: CountingSigner,
    ) -> TokenCacheService<RecordingCache, CountingSigner> {
        TokenCacheService::new(cache, signer, TokenCacheConfig::default())
    }

    #[tokio::test]
    async fn test_cold_cache_mints_and_stores() {
        let cache = RecordingCache::default();
        let signer = CountingSigner::default();
        let service = service_with(cache.clone(), signer.clone());

        let before = Utc::now();
        let url = service
            .get_access_url("doc1", "healthrecord-files", "doc1_healthrecord_abc.png")
            .await
            .unwrap();
        let after = Utc::now();

        assert_eq!(signer.count(), 1);
        let call = &signer.calls()[0];
        assert_eq!(call.container, "healthrecord-files");
        assert_eq!(call.blob, "doc1_healthrecord_abc.png");
        assert!(call.expires_at >= before + ChronoDuration::minutes(60));
        assert!(call.expires_at <= after + ChronoDuration::minutes(60));

        let writes = cache.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0].0,
            "doc1:healthrecord-files:doc1_healthrecord_abc.png"
        );
        assert_eq!(writes[0].1, url);
        assert_eq!(writes[0].2, Duration::from_secs(59 * 60));
    }

    #[tokio::test]
    async fn test_repeat_call_hits_cache() {
        let cache = RecordingCache::default();
        let signer = CountingSigner::default();
        let service = service_with(cache.clone(), signer.clone());

        let first = service
            .get_access_url("doc1", "healthrecord-files", "doc1_healthrecord_abc.png")
            .await
            .unwrap();
        let second = service
            .get_access_url("doc1", "healthrecord-files", "doc1_healthrecord_abc.png")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(signer.count(), 1);
        assert_eq!(cache.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_owners_do_not_share_entries() {
        let cache = RecordingCache::default();
        let signer = CountingSigner::default();
        let service = service_with(cache.clone(), signer.clone());

        let u1 = service
            .get_access_url("doc1", "healthrecord-files", "doc1_healthrecord_abc.png")
            .await
            .unwrap();
        let u2 = service
            .get_access_url("doc2", "healthrecord-files", "doc1_healthrecord_abc.png")
            .await
            .unwrap();

        assert_eq!(signer.count(), 2);
        assert_ne!(u1, u2);
        let keys: Vec<_> = cache.writes().into_iter().map(|w| w.0).collect();
        assert_eq!(
            keys,
            vec![
                "doc1:healthrecord-files:doc1_healthrecord_abc.png".to_string(),
                "doc2:healthrecord-files:doc1_healthrecord_abc.png".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_expired_entries_are_reminted() {
        let cache = AlwaysMissCache::default();
        let signer = CountingSigner::default();
        let service = TokenCacheService::new(cache, signer.clone(), TokenCacheConfig::default());

        for _ in 0..3 {
            service
                .get_access_url("doc1", "healthrecord-files", "a.png")
                .await
                .unwrap();
        }

        assert_eq!(signer.count(), 3);
        assert_eq!(service.cache.sets.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_cached_value_is_a_miss() {
        let cache = RecordingCache::default();
        cache
            .entries
            .lock()
            .unwrap()
            .insert("doc1:files:a.png".to_string(), String::new());
        let signer = CountingSigner::default();
        let service = service_with(cache, signer.clone());

        let url = service.get_access_url("doc1", "files", "a.png").await.unwrap();
        assert!(!url.is_empty());
        assert_eq!(signer.count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_cold_calls_both_succeed() {
        let signer = CountingSigner::default();
        let service = TokenCacheService::new(
            MemoryUrlCache::default(),
            signer.clone(),
            TokenCacheConfig::default(),
        );

        let (a, b) = tokio::join!(
            service.get_access_url("doc1", "files", "a.png"),
            service.get_access_url("doc1", "files", "a.png"),
        );

        assert!(a.unwrap().starts_with("https://store/files/a.png"));
        assert!(b.unwrap().starts_with("https://store/files/a.png"));
        assert!((1..=2).contains(&signer.count()));
    }

    #[tokio::test]
    async fn test_ttl_follows_config() {
        let cache = RecordingCache::default();
        let config =
            TokenCacheConfig::new(Duration::from_secs(600), Duration::from_secs(30)).unwrap();
        let service = TokenCacheService::new(cache.clone(), CountingSigner::default(), config);

        service.get_access_url("o", "files", "b").await.unwrap();

        let ttl = cache.writes()[0].2;
        assert_eq!(ttl, Duration::from_secs(570));
        assert!(ttl < service.config().validity());
    }

    #[tokio::test]
    async fn test_invalid_arguments_fail_before_io() {
        let cache = RecordingCache::default();
        let signer = CountingSigner::default();
        let service = service_with(cache.clone(), signer.clone());

        for (owner, container, blob) in [
            ("", "files", "a.png"),
            ("doc1", " ", "a.png"),
            ("doc1", "files", ""),
            ("doc1", "files", "a\n.png"),
        ] {
            let result = service.get_access_url(owner, container, blob).await;
            assert!(matches!(result, Err(TokenCacheError::InvalidArgument(_))));
        }

        assert_eq!(signer.count(), 0);
        assert!(cache.writes().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let cache = RecordingCache::default();
        let service =
            TokenCacheService::new(cache.clone(), FailingSigner, TokenCacheConfig::default());

        let result = service.get_access_url("doc1", "files", "a.png").await;
        assert!(matches!(
            result,
            Err(TokenCacheError::StorageUnavailable(SignerError::Unavailable(_)))
        ));
        assert!(cache.writes().is_empty());
    }

    #[tokio::test]
    async fn test_cache_read_failure_fails_by_default() {
        let signer = CountingSigner::default();
        let service = TokenCacheService::new(
            UnreachableCache {
                fail_reads: true,
                fail_writes: false,
            },
            signer.clone(),
            TokenCacheConfig::default(),
        );

        let result = service.get_access_url("doc1", "files", "a.png").await;
        assert!(matches!(result, Err(TokenCacheError::CacheUnavailable(_))));
        assert_eq!(signer.count(), 0);
    }

    #[tokio::test]
    async fn test_cache_write_failure_fails_by_default() {
        let service = TokenCacheService::new(
            UnreachableCache {
                fail_reads: false,
                fail_writes: true,
            },
            CountingSigner::default(),
            TokenCacheConfig::default(),
        );

        let result = service.get_access_url("doc1", "files", "a.png").await;
        assert!(matches!(result, Err(TokenCacheError::CacheUnavailable(_))));
    }

    #[tokio::test]
    async fn test_bypass_policy_mints_when_cache_is_down() {
        let signer = CountingSigner::default();
        let service = TokenCacheService::new(
            UnreachableCache {
                fail_reads: true,
                fail_writes: true,
            },
            signer.clone(),
            TokenCacheConfig::default().with_failure_policy(CacheFailurePolicy::BypassCache),
        );

        let first = service.get_access_url("doc1", "files", "a.png").await.unwrap();
        let second = service.get_access_url("doc1", "files", "a.png").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(signer.count(), 2);
    }
}
