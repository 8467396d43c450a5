//! Error types for the signed URL cache

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a [`crate::UrlCache`] backend
#[derive(Error, Debug)]
#[error("{message}")]
pub struct CacheError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl CacheError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Failure reported by a [`crate::ReadUrlSigner`]
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Invalid storage credentials: {0}")]
    Credentials(String),

    #[error("Invalid blob reference: {0}")]
    InvalidReference(String),

    #[error("Storage service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum TokenCacheError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] SignerError),

    #[error("URL cache unavailable: {0}")]
    CacheUnavailable(#[source] CacheError),

    #[error("Invalid token cache configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TokenCacheError>;
