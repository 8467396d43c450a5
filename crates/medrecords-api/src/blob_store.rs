//! Upload and delete attachment bytes in blob storage
//!
//! Every request is authorized by a short-lived SAS appended to the blob
//! URL, so the account key never leaves this process.

use std::sync::Arc;

use access_url_cache::{BlobPermissions, SasSigner, SignerError};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

/// Lifetime of the SAS used for a single upload or delete request
const OPERATION_SAS_MINUTES: i64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("failed to sign storage request: {0}")]
    Signer(#[from] SignerError),

    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage returned status {status} for {operation}")]
    Status {
        operation: &'static str,
        status: StatusCode,
    },
}

/// HTTP client for the blob service
pub struct BlobStore {
    client: Client,
    signer: Arc<SasSigner>,
}

impl BlobStore {
    pub fn new(signer: Arc<SasSigner>) -> Self {
        Self {
            client: Client::new(),
            signer,
        }
    }

    /// Write `data` as a block blob, replacing any existing blob of that name
    pub async fn upload(
        &self,
        container: &str,
        blob: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<(), BlobStoreError> {
        let url = self.operation_url(container, blob, BlobPermissions::CREATE_WRITE)?;
        let size = data.len();

        let response = self
            .client
            .put(&url)
            .header("x-ms-blob-type", "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BlobStoreError::Status {
                operation: "upload",
                status: response.status(),
            });
        }

        info!(container, blob, size, "Uploaded blob");
        Ok(())
    }

    /// Delete a blob. A blob that is already gone counts as deleted.
    pub async fn delete(&self, container: &str, blob: &str) -> Result<(), BlobStoreError> {
        let url = self.operation_url(container, blob, BlobPermissions::DELETE)?;

        let response = self.client.delete(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(container, blob, "Blob already deleted");
            return Ok(());
        }
        if !status.is_success() {
            return Err(BlobStoreError::Status {
                operation: "delete",
                status,
            });
        }

        info!(container, blob, "Deleted blob");
        Ok(())
    }

    fn operation_url(
        &self,
        container: &str,
        blob: &str,
        permissions: BlobPermissions,
    ) -> Result<String, BlobStoreError> {
        let expires_at = Utc::now() + chrono::Duration::minutes(OPERATION_SAS_MINUTES);
        Ok(self.signer.sign(container, blob, permissions, expires_at)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_KEY: &str =
        "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

    fn store() -> BlobStore {
        let signer = SasSigner::new(
            "devstoreaccount1",
            DEV_KEY,
            "http://127.0.0.1:10000/devstoreaccount1",
        )
        .unwrap();
        BlobStore::new(Arc::new(signer))
    }

    #[test]
    fn test_operation_urls_carry_operation_permissions() {
        let s = store();
        let put = s
            .operation_url("files", "a.pdf", BlobPermissions::CREATE_WRITE)
            .unwrap();
        let del = s
            .operation_url("files", "a.pdf", BlobPermissions::DELETE)
            .unwrap();
        assert!(put.contains("&sp=cw&"));
        assert!(del.contains("&sp=d&"));
    }

    #[tokio::test]
    async fn test_invalid_container_fails_before_request() {
        let result = store()
            .upload("Bad_Container", "a.pdf", "application/pdf", vec![1, 2, 3])
            .await;
        assert!(matches!(result, Err(BlobStoreError::Signer(_))));
    }
}
