pub mod accounts;
pub mod allergies;
pub mod emergency_contacts;
pub mod files;
pub mod health_records;
pub mod hospitals;
pub mod migrate;
pub mod patients;
pub mod prescriptions;
pub mod procedures;
pub mod staff;
pub mod types;
pub mod url_cache;

pub use sqlx::postgres::PgPool;
pub use types::*;

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("smith"), "%smith%");
        assert_eq!(like_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }
}
