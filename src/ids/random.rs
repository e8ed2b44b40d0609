//! Opaque random identifiers for records that need no human-readable number.
//!
//! Independent of the counter store; these never fail.

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

/// Length of `short_id` output.
pub const SHORT_ID_LEN: usize = 8;

/// Hyphenated UUID v4, e.g. for upload tokens or file names.
pub fn random_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// `len` characters drawn from `[A-Za-z0-9]`.
pub fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Eight-character upper-case alphanumeric token.
pub fn short_id() -> String {
    random_alphanumeric(SHORT_ID_LEN).to_ascii_uppercase()
}
