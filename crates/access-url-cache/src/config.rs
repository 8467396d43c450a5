use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TokenCacheError};

/// Default validity window of a minted URL (1 hour)
pub const DEFAULT_URL_VALIDITY: Duration = Duration::from_secs(60 * 60);

/// Default gap between cache expiry and URL expiry (1 minute)
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// What to do when the URL cache cannot be read or written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheFailurePolicy {
    /// Surface the failure as [`TokenCacheError::CacheUnavailable`]
    #[default]
    FailRequest,
    /// Treat a failed read as a miss and ignore a failed write; every call
    /// mints a fresh URL while the cache is down
    BypassCache,
}

impl FromStr for CacheFailurePolicy {
    type Err = TokenCacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "fail-request" => Ok(Self::FailRequest),
            "bypass" | "bypass-cache" => Ok(Self::BypassCache),
            other => Err(TokenCacheError::InvalidConfig(format!(
                "unknown cache failure policy: {other}"
            ))),
        }
    }
}

/// Timing and degradation settings for [`crate::TokenCacheService`].
///
/// Constructed only through [`TokenCacheConfig::new`] (or `Default`), which
/// guarantees `0 < cache_ttl() < validity()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCacheConfig {
    validity: Duration,
    safety_margin: Duration,
    on_cache_failure: CacheFailurePolicy,
}

impl TokenCacheConfig {
    pub fn new(validity: Duration, safety_margin: Duration) -> Result<Self> {
        if validity.is_zero() {
            return Err(TokenCacheError::InvalidConfig(
                "URL validity window must be positive".to_string(),
            ));
        }
        if safety_margin.is_zero() {
            return Err(TokenCacheError::InvalidConfig(
                "cache safety margin must be positive".to_string(),
            ));
        }
        if safety_margin >= validity {
            return Err(TokenCacheError::InvalidConfig(format!(
                "cache safety margin ({}s) must be shorter than the URL validity window ({}s)",
                safety_margin.as_secs(),
                validity.as_secs()
            )));
        }

        Ok(Self {
            validity,
            safety_margin,
            on_cache_failure: CacheFailurePolicy::default(),
        })
    }

    pub fn with_failure_policy(mut self, policy: CacheFailurePolicy) -> Self {
        self.on_cache_failure = policy;
        self
    }

    /// How long a minted URL stays valid
    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn safety_margin(&self) -> Duration {
        self.safety_margin
    }

    /// How long a minted URL is kept in the cache
    pub fn cache_ttl(&self) -> Duration {
        self.validity - self.safety_margin
    }

    pub fn on_cache_failure(&self) -> CacheFailurePolicy {
        self.on_cache_failure
    }
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self {
            validity: DEFAULT_URL_VALIDITY,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            on_cache_failure: CacheFailurePolicy::FailRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TokenCacheConfig::default();
        assert_eq!(config.validity(), Duration::from_secs(3600));
        assert_eq!(config.safety_margin(), Duration::from_secs(60));
        assert_eq!(config.cache_ttl(), Duration::from_secs(59 * 60));
        assert_eq!(config.on_cache_failure(), CacheFailurePolicy::FailRequest);
    }

    #[test]
    fn test_cache_ttl_below_validity() {
        for (validity, margin) in [(3600, 60), (120, 1), (2, 1), (86_400, 3600)] {
            let config =
                TokenCacheConfig::new(Duration::from_secs(validity), Duration::from_secs(margin))
                    .unwrap();
            assert!(config.cache_ttl() < config.validity());
            assert!(!config.cache_ttl().is_zero());
        }
    }

    #[test]
    fn test_rejects_margin_not_below_validity() {
        let result = TokenCacheConfig::new(Duration::from_secs(60), Duration::from_secs(60));
        assert!(matches!(result, Err(TokenCacheError::InvalidConfig(_))));

        let result = TokenCacheConfig::new(Duration::from_secs(60), Duration::from_secs(90));
        assert!(matches!(result, Err(TokenCacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_durations() {
        assert!(TokenCacheConfig::new(Duration::ZERO, Duration::from_secs(1)).is_err());
        assert!(TokenCacheConfig::new(Duration::from_secs(60), Duration::ZERO).is_err());
    }

    #[test]
    fn test_failure_policy_from_str() {
        assert_eq!(
            "fail".parse::<CacheFailurePolicy>().unwrap(),
            CacheFailurePolicy::FailRequest
        );
        assert_eq!(
            " Bypass ".parse::<CacheFailurePolicy>().unwrap(),
            CacheFailurePolicy::BypassCache
        );
        assert!("retry".parse::<CacheFailurePolicy>().is_err());
    }

    #[test]
    fn test_with_failure_policy() {
        let config = TokenCacheConfig::default().with_failure_policy(CacheFailurePolicy::BypassCache);
        assert_eq!(config.on_cache_failure(), CacheFailurePolicy::BypassCache);
        assert_eq!(config.cache_ttl(), Duration::from_secs(59 * 60));
    }
}
