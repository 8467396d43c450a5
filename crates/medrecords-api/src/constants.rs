// --- Upload limits ---

/// Maximum decoded size of a single health record attachment.
pub const MAX_FILE_BYTES: usize = 25 * 1024 * 1024;

/// Request body limit; base64 inflates the payload by about a third.
pub const MAX_REQUEST_BODY_BYTES: usize = 40 * 1024 * 1024;

/// Maximum length of an uploaded file's original name.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Longest extension kept when building a blob name.
pub const MAX_EXTENSION_LENGTH: usize = 10;

// --- Validation limits ---

/// Maximum length of short text fields (names, titles, phone numbers).
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of free-text fields (notes, diagnosis, descriptions).
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length in UTF-8 bytes; bcrypt ignores bytes past 72.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Allergy severities accepted by the database.
pub const ALLERGY_SEVERITIES: &[&str] = &["mild", "moderate", "severe"];

// --- Background maintenance ---

/// Interval between purges of expired sessions and cached URLs.
pub const PURGE_INTERVAL_SECS: u64 = 10 * 60;
