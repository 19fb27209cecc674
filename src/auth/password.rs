//! Cached-credential verification

use tracing::warn;

/// Rewrites a `$2y$` bcrypt tag to `$2a$`.
///
/// The server's framework emits `$2y$`-tagged hashes; the verifier here
/// expects `$2a$` for the same underlying algorithm, so the tag is
/// normalized before comparison. Hashes with any other tag pass through
/// unchanged.
pub(crate) fn normalize_bcrypt_tag(hash: &str) -> String {
    match hash.strip_prefix("$2y$") {
        Some(rest) => format!("$2a${rest}"),
        None => hash.to_string(),
    }
}

/// Verifies a password against a cached bcrypt hash. An uncomparable
/// hash (truncated, wrong format) counts as a failed verification, not an
/// error.
pub(crate) fn verify_cached_password(password: &str, stored_hash: &str) -> bool {
    let hash = normalize_bcrypt_tag(stored_hash);
    match bcrypt::verify(password, &hash) {
        Ok(matches) => matches,
        Err(error) => {
            warn!(error = %error, "cached password hash could not be compared");
            false
        }
    }
}
