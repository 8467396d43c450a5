use std::env;
use std::time::Duration;

use access_url_cache::{CacheFailurePolicy, TokenCacheConfig, TokenCacheError};

/// Azurite's published development account key
const DEV_STORAGE_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Where signed URLs are cached between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlCacheKind {
    /// Shared `access_url_cache` table, visible to every instance
    Postgres,
    /// Process-local moka cache
    Memory,
}

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub storage_account: String,
    pub storage_account_key: String,
    pub storage_endpoint: String,
    pub files_container: String,
    pub url_validity_secs: u64,
    pub url_cache_margin_secs: u64,
    pub url_cache_kind: UrlCacheKind,
    pub url_cache_failure_policy: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3004);

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/medrecords".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let storage_account =
            env::var("STORAGE_ACCOUNT").unwrap_or_else(|_| "devstoreaccount1".to_string());
        let storage_account_key =
            env::var("STORAGE_ACCOUNT_KEY").unwrap_or_else(|_| DEV_STORAGE_KEY.to_string());
        let storage_endpoint = env::var("STORAGE_ENDPOINT")
            .unwrap_or_else(|_| format!("http://127.0.0.1:10000/{storage_account}"));

        let files_container = env::var("HEALTHRECORD_FILES_CONTAINER")
            .unwrap_or_else(|_| "healthrecord-files".to_string());

        let url_validity_secs = env::var("URL_VALIDITY_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60 * 60);

        let url_cache_margin_secs = env::var("URL_CACHE_MARGIN_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let url_cache_kind = match env::var("URL_CACHE_BACKEND").as_deref() {
            Ok("memory") => UrlCacheKind::Memory,
            _ => UrlCacheKind::Postgres,
        };

        let url_cache_failure_policy =
            env::var("URL_CACHE_FAILURE_POLICY").unwrap_or_else(|_| "fail".to_string());

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(12);

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            port,
            database_url,
            cors_origins,
            storage_account,
            storage_account_key,
            storage_endpoint,
            files_container,
            url_validity_secs,
            url_cache_margin_secs,
            url_cache_kind,
            url_cache_failure_policy,
            session_ttl_hours,
            cookie_secure,
        }
    }

    /// Build the signed URL cache settings, rejecting a margin that would
    /// let cached URLs outlive their signature
    pub fn token_cache(&self) -> Result<TokenCacheConfig, TokenCacheError> {
        let policy: CacheFailurePolicy = self.url_cache_failure_policy.parse()?;
        Ok(TokenCacheConfig::new(
            Duration::from_secs(self.url_validity_secs),
            Duration::from_secs(self.url_cache_margin_secs),
        )?
        .with_failure_policy(policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            port: 3004,
            database_url: "postgres://localhost/medrecords".to_string(),
            cors_origins: vec![],
            storage_account: "devstoreaccount1".to_string(),
            storage_account_key: DEV_STORAGE_KEY.to_string(),
            storage_endpoint: "http://127.0.0.1:10000/devstoreaccount1".to_string(),
            files_container: "healthrecord-files".to_string(),
            url_validity_secs: 3600,
            url_cache_margin_secs: 60,
            url_cache_kind: UrlCacheKind::Memory,
            url_cache_failure_policy: "fail".to_string(),
            session_ttl_hours: 12,
            cookie_secure: false,
        }
    }

    #[test]
    fn test_token_cache_defaults() {
        let tc = config().token_cache().unwrap();
        assert_eq!(tc.cache_ttl(), Duration::from_secs(59 * 60));
        assert_eq!(tc.on_cache_failure(), CacheFailurePolicy::FailRequest);
    }

    #[test]
    fn test_token_cache_bypass_policy() {
        let mut c = config();
        c.url_cache_failure_policy = "bypass".to_string();
        let tc = c.token_cache().unwrap();
        assert_eq!(tc.on_cache_failure(), CacheFailurePolicy::BypassCache);
    }

    #[test]
    fn test_token_cache_rejects_margin_too_large() {
        let mut c = config();
        c.url_cache_margin_secs = 3600;
        assert!(c.token_cache().is_err());
    }

    #[test]
    fn test_token_cache_rejects_unknown_policy() {
        let mut c = config();
        c.url_cache_failure_policy = "stale".to_string();
        assert!(c.token_cache().is_err());
    }
}
