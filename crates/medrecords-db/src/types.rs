use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;

/// Default page size for paginated lists (patients, staff)
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size for paginated lists
pub const MAX_PAGE_SIZE: i64 = 100;

/// Account role used for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Patient => "patient",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            "nurse" => Some(Role::Nurse),
            "patient" => Some(Role::Patient),
            _ => None,
        }
    }

    /// Admins, doctors and nurses
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Patient)
    }
}

/// Normalized page/size pair for paginated queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Clamp raw query values: page >= 1, 1 <= page_size <= MAX_PAGE_SIZE
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// One page of results plus the totals the client needs to paginate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: i64) -> Self {
        let total_pages = if total_count <= 0 {
            0
        } else {
            (total_count + request.page_size - 1) / request.page_size
        };
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_count,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HospitalRow {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    #[ts(optional)]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HospitalParams {
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct StaffRow {
    pub id: i64,
    #[ts(optional)]
    pub hospital_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[ts(optional)]
    pub phone: Option<String>,
    #[ts(optional)]
    pub specialization: Option<String>,
    pub position: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StaffParams {
    pub hospital_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub position: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PatientRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[ts(optional)]
    pub gender: Option<String>,
    #[ts(optional)]
    pub email: Option<String>,
    #[ts(optional)]
    pub phone: Option<String>,
    #[ts(optional)]
    pub address: Option<String>,
    #[ts(optional)]
    pub blood_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PatientParams {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub blood_type: Option<String>,
}

/// Account row including the password hash; never serialized
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub staff_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub staff_id: Option<i64>,
    pub patient_id: Option<i64>,
}

/// Account resolved from a live session token
#[derive(Debug, Clone, FromRow)]
pub struct SessionAccountRow {
    pub account_id: i64,
    pub email: String,
    pub role: String,
    pub staff_id: Option<i64>,
    pub patient_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HealthRecordRow {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_account_id: i64,
    #[ts(optional)]
    pub hospital_id: Option<i64>,
    pub title: String,
    #[ts(optional)]
    pub diagnosis: Option<String>,
    #[ts(optional)]
    pub notes: Option<String>,
    pub visit_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HealthRecordParams {
    pub patient_id: i64,
    pub hospital_id: Option<i64>,
    pub title: String,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub visit_date: NaiveDate,
}

/// Attachment metadata; the bytes live in blob storage under `blob_name`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecordFileRow {
    pub id: i64,
    pub health_record_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub blob_name: String,
    pub size_bytes: i64,
    pub uploaded_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateFileParams {
    pub health_record_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub blob_name: String,
    pub size_bytes: i64,
    pub uploaded_by: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PrescriptionRow {
    pub id: i64,
    pub health_record_id: i64,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    #[ts(optional)]
    pub end_date: Option<NaiveDate>,
    #[ts(optional)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PrescriptionParams {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ProcedureRow {
    pub id: i64,
    pub health_record_id: i64,
    pub name: String,
    #[ts(optional)]
    pub description: Option<String>,
    pub performed_at: DateTime<Utc>,
    #[ts(optional)]
    pub outcome: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProcedureParams {
    pub name: String,
    pub description: Option<String>,
    pub performed_at: DateTime<Utc>,
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AllergyRow {
    pub id: i64,
    pub patient_id: i64,
    pub allergen: String,
    #[ts(optional)]
    pub reaction: Option<String>,
    pub severity: String,
}

#[derive(Debug, Clone)]
pub struct AllergyParams {
    pub allergen: String,
    pub reaction: Option<String>,
    pub severity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EmergencyContactRow {
    pub id: i64,
    pub patient_id: i64,
    pub name: String,
    pub relationship: String,
    pub phone: String,
    #[ts(optional)]
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmergencyContactParams {
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::new(None, None);
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);

        let req = PageRequest::new(Some(-4), Some(0));
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, 1);
    }

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::new(Some(3), Some(25)).offset(), 50);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let req = PageRequest::new(Some(1), Some(20));
        assert_eq!(Page::<AllergyRow>::new(vec![], req, 0).total_pages, 0);
        assert_eq!(Page::<AllergyRow>::new(vec![], req, 1).total_pages, 1);
        assert_eq!(Page::<AllergyRow>::new(vec![], req, 20).total_pages, 1);
        assert_eq!(Page::<AllergyRow>::new(vec![], req, 41).total_pages, 3);
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let req = PageRequest::new(Some(2), Some(10));
        let page = Page::<AllergyRow>::new(vec![], req, 15);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["totalCount"], 15);
        assert_eq!(json["totalPages"], 2);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Doctor, Role::Nurse, Role::Patient] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("janitor"), None);
        assert!(Role::Nurse.is_staff());
        assert!(!Role::Patient.is_staff());
    }
}
