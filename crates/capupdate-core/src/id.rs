//! Public record identifiers.
//!
//! Ids are short random strings over `[A-Za-z0-9]`. They double as the
//! public lookup token in `/api/apps/{id}`, so they must be URL-safe and
//! must never contain `/`.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of ids handed out by the catalog.
pub const DEFAULT_ID_LEN: usize = 10;

/// Generate a random alphanumeric id of `len` characters.
///
/// Uniqueness against existing records is the caller's concern.
#[must_use]
pub fn generate_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Whether `id` could have come from [`generate_id`].
///
/// Anything else cannot name a stored record.
#[must_use]
pub fn is_well_formed(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric())
}
