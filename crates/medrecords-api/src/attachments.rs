//! Health record attachments as returned to clients, with signed read URLs

use std::collections::HashMap;

use access_url_cache::{ReadUrlSigner, TokenCacheService, UrlCache};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use medrecords_db::types::{
    HealthRecordFileRow, HealthRecordRow, PrescriptionRow, ProcedureRow,
};
use serde::Serialize;
use ts_rs::TS;

use crate::constants::MAX_EXTENSION_LENGTH;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FileResponse {
    pub id: i64,
    pub health_record_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    /// Time-limited read-only URL
    pub url: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HealthRecordResponse {
    #[serde(flatten)]
    pub record: HealthRecordRow,
    pub files: Vec<FileResponse>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HealthRecordDetail {
    #[serde(flatten)]
    pub record: HealthRecordRow,
    pub files: Vec<FileResponse>,
    pub prescriptions: Vec<PrescriptionRow>,
    pub procedures: Vec<ProcedureRow>,
}

/// Resolve read URLs for files that all belong to records of one doctor.
///
/// URLs are namespaced by the attending doctor's account, whoever asks.
pub async fn file_responses<C, S>(
    access_urls: &TokenCacheService<C, S>,
    container: &str,
    doctor_account_id: i64,
    files: Vec<HealthRecordFileRow>,
) -> Result<Vec<FileResponse>, AppError>
where
    C: UrlCache,
    S: ReadUrlSigner,
{
    let owner = doctor_account_id.to_string();
    let urls = try_join_all(
        files
            .iter()
            .map(|f| access_urls.get_access_url(&owner, container, &f.blob_name)),
    )
    .await?;

    Ok(files
        .into_iter()
        .zip(urls)
        .map(|(f, url)| file_response(f, url))
        .collect())
}

/// Attach files to records, resolving every URL of the batch concurrently
pub async fn record_responses<C, S>(
    access_urls: &TokenCacheService<C, S>,
    container: &str,
    records: Vec<HealthRecordRow>,
    files: Vec<HealthRecordFileRow>,
) -> Result<Vec<HealthRecordResponse>, AppError>
where
    C: UrlCache,
    S: ReadUrlSigner,
{
    let doctor_by_record: HashMap<i64, i64> = records
        .iter()
        .map(|r| (r.id, r.doctor_account_id))
        .collect();

    // Files of records outside this batch are dropped rather than signed
    let files: Vec<(i64, HealthRecordFileRow)> = files
        .into_iter()
        .filter_map(|f| {
            doctor_by_record
                .get(&f.health_record_id)
                .map(|doctor| (*doctor, f))
        })
        .collect();

    let owners: Vec<String> = files.iter().map(|(d, _)| d.to_string()).collect();
    let urls = try_join_all(
        files
            .iter()
            .zip(&owners)
            .map(|((_, f), owner)| access_urls.get_access_url(owner, container, &f.blob_name)),
    )
    .await?;

    let mut by_record: HashMap<i64, Vec<FileResponse>> = HashMap::new();
    for ((_, f), url) in files.into_iter().zip(urls) {
        by_record
            .entry(f.health_record_id)
            .or_default()
            .push(file_response(f, url));
    }

    Ok(records
        .into_iter()
        .map(|record| HealthRecordResponse {
            files: by_record.remove(&record.id).unwrap_or_default(),
            record,
        })
        .collect())
}

fn file_response(f: HealthRecordFileRow, url: String) -> FileResponse {
    FileResponse {
        id: f.id,
        health_record_id: f.health_record_id,
        file_name: f.file_name,
        content_type: f.content_type,
        size_bytes: f.size_bytes,
        created_at: f.created_at,
        url,
    }
}

/// Blob name for a new attachment: `{doctor}_healthrecord_{uuid}{.ext}`.
///
/// The extension is taken from the uploaded name and kept only if it is
/// short and alphanumeric.
pub fn blob_name(doctor_account_id: i64, file_name: &str) -> String {
    let id = uuid::Uuid::new_v4().simple();
    match extension(file_name) {
        Some(ext) => format!("{doctor_account_id}_healthrecord_{id}.{ext}"),
        None => format!("{doctor_account_id}_healthrecord_{id}"),
    }
}

fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LENGTH
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Decode a base64 upload, rejecting anything over `max_bytes`
pub fn decode_upload(data: &str, max_bytes: usize) -> Result<Vec<u8>, AppError> {
    use base64::Engine;

    // Reject early without decoding; 4 base64 chars encode 3 bytes
    if data.len() / 4 * 3 > max_bytes + 3 {
        return Err(AppError::BadRequest(format!(
            "File exceeds the {} MiB limit",
            max_bytes / (1024 * 1024)
        )));
    }

    // Accept data URLs as produced by FileReader.readAsDataURL
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 file data: {e}")))?;

    if bytes.is_empty() {
        return Err(AppError::BadRequest("File is empty".into()));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::BadRequest(format!(
            "File exceeds the {} MiB limit",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_url_cache::{MemoryUrlCache, SasSigner, TokenCacheConfig};
    use base64::Engine;
    use chrono::NaiveDate;

    const DEV_KEY: &str =
        "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
    const CONTAINER: &str = "healthrecord-files";

    fn service() -> TokenCacheService<MemoryUrlCache, SasSigner> {
        let signer = SasSigner::new(
            "devstoreaccount1",
            DEV_KEY,
            "http://127.0.0.1:10000/devstoreaccount1",
        )
        .unwrap();
        TokenCacheService::new(
            MemoryUrlCache::default(),
            signer,
            TokenCacheConfig::default(),
        )
    }

    fn record(id: i64, doctor: i64) -> HealthRecordRow {
        HealthRecordRow {
            id,
            patient_id: 1,
            doctor_account_id: doctor,
            hospital_id: None,
            title: format!("Visit {id}"),
            diagnosis: None,
            notes: None,
            visit_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn file(id: i64, record_id: i64, blob: &str) -> HealthRecordFileRow {
        HealthRecordFileRow {
            id,
            health_record_id: record_id,
            file_name: "scan.png".into(),
            content_type: "image/png".into(),
            blob_name: blob.into(),
            size_bytes: 42,
            uploaded_by: 9,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_file_responses_carry_read_urls() {
        let svc = service();
        let files = vec![file(1, 10, "5_healthrecord_a.png"), file(2, 10, "5_healthrecord_b.pdf")];
        let out = file_responses(&svc, CONTAINER, 5, files).await.unwrap();

        assert_eq!(out.len(), 2);
        assert!(out[0]
            .url
            .contains("/healthrecord-files/5_healthrecord_a.png?"));
        assert!(out[1]
            .url
            .contains("/healthrecord-files/5_healthrecord_b.pdf?"));
        assert!(out.iter().all(|f| f.url.contains("&sp=r&")));
    }

    #[tokio::test]
    async fn test_repeated_resolution_hits_cache() {
        let svc = service();
        let first = file_responses(&svc, CONTAINER, 5, vec![file(1, 10, "x.png")])
            .await
            .unwrap();
        let second = file_responses(&svc, CONTAINER, 5, vec![file(1, 10, "x.png")])
            .await
            .unwrap();
        assert_eq!(first[0].url, second[0].url);
    }

    #[tokio::test]
    async fn test_record_responses_group_files() {
        let svc = service();
        let records = vec![record(10, 5), record(11, 6), record(12, 5)];
        let files = vec![
            file(1, 10, "5_healthrecord_a.png"),
            file(2, 11, "6_healthrecord_b.png"),
            file(3, 10, "5_healthrecord_c.png"),
            file(4, 99, "orphan.png"),
        ];

        let out = record_responses(&svc, CONTAINER, records, files)
            .await
            .unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].record.id, 10);
        assert_eq!(out[0].files.len(), 2);
        assert_eq!(out[1].files.len(), 1);
        assert!(out[2].files.is_empty());
    }

    #[tokio::test]
    async fn test_unsignable_blob_fails_whole_response() {
        let svc = service();
        let files = vec![file(1, 10, "ok.png"), file(2, 10, "ok2.png")];
        let result = file_responses(&svc, "Bad_Container", 5, files).await;
        assert!(matches!(result, Err(AppError::TokenCache(_))));
    }

    #[test]
    fn test_response_flattens_record() {
        let resp = HealthRecordResponse {
            record: record(10, 5),
            files: vec![],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["id"], 10);
        assert_eq!(json["doctorAccountId"], 5);
        assert!(json["files"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_blob_name_format() {
        let name = blob_name(7, "Chest X-Ray.PNG");
        assert!(name.starts_with("7_healthrecord_"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "7_healthrecord_".len() + 32 + ".png".len());

        assert_ne!(blob_name(7, "a.png"), blob_name(7, "a.png"));
    }

    #[test]
    fn test_blob_name_drops_unsafe_extensions() {
        assert!(!blob_name(7, "noext").contains('.'));
        assert!(!blob_name(7, ".bashrc").contains('.'));
        assert!(!blob_name(7, "a.p/ng").contains('.'));
        assert!(!blob_name(7, "a.extremelylongext").contains('.'));
    }

    #[test]
    fn test_decode_upload() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"hello");
        assert_eq!(decode_upload(&encoded, 1024).unwrap(), b"hello");

        let data_url = format!("data:text/plain;base64,{encoded}");
        assert_eq!(decode_upload(&data_url, 1024).unwrap(), b"hello");

        assert!(decode_upload("!!!", 1024).is_err());
        assert!(decode_upload("", 1024).is_err());

        let big = base64::engine::general_purpose::STANDARD.encode(vec![0u8; 2048]);
        assert!(decode_upload(&big, 1024).is_err());
    }
}
