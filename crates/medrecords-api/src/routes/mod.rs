pub mod accounts;
pub mod allergies;
pub mod auth;
pub mod emergency_contacts;
pub mod files;
pub mod health;
pub mod health_records;
pub mod hospitals;
pub mod patients;
pub mod prescriptions;
pub mod procedures;
pub mod staff;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::constants::MAX_REQUEST_BODY_BYTES;
use crate::state::AppState;

/// All API routes, with state applied
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health))
        // Auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/accounts", post(accounts::create_account))
        // Hospitals
        .route(
            "/api/hospitals",
            get(hospitals::list).post(hospitals::create),
        )
        .route(
            "/api/hospitals/{id}",
            get(hospitals::get)
                .put(hospitals::update)
                .delete(hospitals::delete),
        )
        // Staff
        .route("/api/staff", get(staff::list).post(staff::create))
        .route(
            "/api/staff/{id}",
            get(staff::get).put(staff::update).delete(staff::delete),
        )
        // Patients and their patient-level data
        .route("/api/patients", get(patients::list).post(patients::create))
        .route(
            "/api/patients/{id}",
            get(patients::get)
                .put(patients::update)
                .delete(patients::delete),
        )
        .route(
            "/api/patients/{id}/allergies",
            get(allergies::list).post(allergies::create),
        )
        .route("/api/allergies/{id}", delete(allergies::delete))
        .route(
            "/api/patients/{id}/emergency-contacts",
            get(emergency_contacts::list).post(emergency_contacts::create),
        )
        .route(
            "/api/emergency-contacts/{id}",
            put(emergency_contacts::update).delete(emergency_contacts::delete),
        )
        .route(
            "/api/patients/{id}/health-records",
            get(health_records::list_for_patient),
        )
        // Health records and their children
        .route("/api/health-records", post(health_records::create))
        .route(
            "/api/health-records/{id}",
            get(health_records::get)
                .put(health_records::update)
                .delete(health_records::delete),
        )
        .route(
            "/api/health-records/{id}/prescriptions",
            get(prescriptions::list).post(prescriptions::create),
        )
        .route("/api/prescriptions/{id}", delete(prescriptions::delete))
        .route(
            "/api/health-records/{id}/procedures",
            get(procedures::list).post(procedures::create),
        )
        .route("/api/procedures/{id}", delete(procedures::delete))
        .route(
            "/api/health-records/{id}/files",
            get(files::list).post(files::upload),
        )
        .route("/api/files/{id}", delete(files::delete))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES)) // base64-encoded attachments
        .with_state(state)
}
