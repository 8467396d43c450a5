//! Signed blob URL cache
//!
//! Hands out time-limited, read-only URLs for stored blobs. URLs are minted
//! by a [`ReadUrlSigner`] and kept in a shared [`UrlCache`] for slightly less
//! than their own validity window, so a cached URL is never served after it
//! has expired.

mod cache;
mod config;
mod error;
mod key;
mod service;
mod signer;

pub use cache::{MemoryUrlCache, UrlCache};
pub use config::{CacheFailurePolicy, TokenCacheConfig};
pub use error::{CacheError, Result, SignerError, TokenCacheError};
pub use key::CacheKey;
pub use service::TokenCacheService;
pub use signer::{BlobPermissions, ReadUrlSigner, SasSigner};
