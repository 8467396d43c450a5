//! Signed URL generation for blob storage

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::error::SignerError;

type HmacSha256 = Hmac<Sha256>;

/// Storage service version the shared access signature is computed for
const SAS_VERSION: &str = "2021-08-06";

/// Signed resource type: a single blob
const SIGNED_RESOURCE_BLOB: &str = "b";

const MAX_BLOB_NAME_LEN: usize = 1024;

/// Mints time-limited read-only URLs for blobs.
#[async_trait]
pub trait ReadUrlSigner: Send + Sync {
    /// Return a URL granting read access to `container/blob` until `expires_at`.
    ///
    /// Minting does not check that the blob exists.
    async fn mint_read_url(
        &self,
        container: &str,
        blob: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, SignerError>;
}

/// Permissions encoded into a shared access signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobPermissions {
    pub read: bool,
    pub create: bool,
    pub write: bool,
    pub delete: bool,
}

impl BlobPermissions {
    pub const READ: Self = Self {
        read: true,
        create: false,
        write: false,
        delete: false,
    };

    pub const CREATE_WRITE: Self = Self {
        read: false,
        create: true,
        write: true,
        delete: false,
    };

    pub const DELETE: Self = Self {
        read: false,
        create: false,
        write: false,
        delete: true,
    };

    /// Permission string in the order the storage service expects
    pub fn as_sas_str(&self) -> String {
        let mut sp = String::with_capacity(4);
        if self.read {
            sp.push('r');
        }
        if self.create {
            sp.push('c');
        }
        if self.write {
            sp.push('w');
        }
        if self.delete {
            sp.push('d');
        }
        sp
    }
}

/// Service SAS signer using a storage account shared key.
///
/// Signing is a local HMAC computation; no request reaches the storage
/// service until the URL is dereferenced.
pub struct SasSigner {
    account: String,
    key: Vec<u8>,
    endpoint: String,
}

impl std::fmt::Debug for SasSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SasSigner")
            .field("account", &self.account)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SasSigner {
    /// `account_key` is the base64 shared key; `endpoint` is the blob service
    /// base URL, e.g. `https://myaccount.blob.core.windows.net`
    pub fn new(account: &str, account_key: &str, endpoint: &str) -> Result<Self, SignerError> {
        if account.is_empty() {
            return Err(SignerError::Credentials(
                "storage account name is empty".to_string(),
            ));
        }
        let key = STANDARD.decode(account_key.trim()).map_err(|e| {
            SignerError::Credentials(format!("account key is not valid base64: {e}"))
        })?;

        Ok(Self {
            account: account.to_string(),
            key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Unsigned URL of a blob
    pub fn blob_url(&self, container: &str, blob: &str) -> String {
        format!("{}/{}/{}", self.endpoint, container, encode_blob_path(blob))
    }

    /// Produce a signed URL for `container/blob` with the given permissions
    pub fn sign(
        &self,
        container: &str,
        blob: &str,
        permissions: BlobPermissions,
        expires_at: DateTime<Utc>,
    ) -> Result<String, SignerError> {
        validate_container_name(container)?;
        validate_blob_name(blob)?;

        let sp = permissions.as_sas_str();
        if sp.is_empty() {
            return Err(SignerError::InvalidReference(
                "at least one permission is required".to_string(),
            ));
        }

        let se = expires_at.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let canonical_resource = format!("/blob/{}/{}/{}", self.account, container, blob);

        // sp, st, se, resource, si, sip, spr, sv, sr, snapshot, ses, rscc, rscd, rsce, rscl, rsct
        let string_to_sign = [
            sp.as_str(),
            "",
            se.as_str(),
            canonical_resource.as_str(),
            "",
            "",
            "",
            SAS_VERSION,
            SIGNED_RESOURCE_BLOB,
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ]
        .join("\n");

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| SignerError::Credentials(format!("invalid account key: {e}")))?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        debug!(container, blob, permissions = %sp, expires_at = %se, "Signed blob URL");

        Ok(format!(
            "{}?sv={}&se={}&sr={}&sp={}&sig={}",
            self.blob_url(container, blob),
            SAS_VERSION,
            urlencoding::encode(&se),
            SIGNED_RESOURCE_BLOB,
            sp,
            urlencoding::encode(&signature)
        ))
    }
}

#[async_trait]
impl ReadUrlSigner for SasSigner {
    async fn mint_read_url(
        &self,
        container: &str,
        blob: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, SignerError> {
        self.sign(container, blob, BlobPermissions::READ, expires_at)
    }
}

#[async_trait]
impl<T: ReadUrlSigner + ?Sized> ReadUrlSigner for Arc<T> {
    async fn mint_read_url(
        &self,
        container: &str,
        blob: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, SignerError> {
        (**self).mint_read_url(container, blob, expires_at).await
    }
}

fn encode_blob_path(blob: &str) -> String {
    blob.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn validate_container_name(container: &str) -> Result<(), SignerError> {
    let valid_chars = container
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !(3..=63).contains(&container.len())
        || !valid_chars
        || container.starts_with('-')
        || container.ends_with('-')
        || container.contains("--")
    {
        return Err(SignerError::InvalidReference(format!(
            "invalid container name: {container:?}"
        )));
    }
    Ok(())
}

fn validate_blob_name(blob: &str) -> Result<(), SignerError> {
    if blob.is_empty() || blob.len() > MAX_BLOB_NAME_LEN {
        return Err(SignerError::InvalidReference(format!(
            "blob name must be 1-{MAX_BLOB_NAME_LEN} characters"
        )));
    }
    Ok(())
}
