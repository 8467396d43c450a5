use std::sync::Arc;

use access_url_cache::{SasSigner, TokenCacheService};
use sqlx::postgres::PgPool;

use crate::blob_store::BlobStore;
use crate::url_cache_store::UrlCacheBackend;

/// The concrete signed URL service with the configured cache and SAS signing.
pub type AccessUrlService = TokenCacheService<UrlCacheBackend, Arc<SasSigner>>;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub access_urls: Arc<AccessUrlService>,
    pub blobs: Arc<BlobStore>,
    /// Container holding health record attachments
    pub files_container: String,
    pub session_ttl: chrono::Duration,
    pub cookie_secure: bool,
}
