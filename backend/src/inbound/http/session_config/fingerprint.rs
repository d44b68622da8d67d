//! Truncated SHA-256 fingerprint of a session key.
//!
//! Logged when a service starts so operators can confirm the catalogue and
//! cart front ends picked up the intended key file without printing it.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

/// Length of the fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// First eight bytes of the SHA-256 of the key's signing half, hex encoded.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use storefront::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let key = Key::generate();
/// let fp = key_fingerprint(&key);
///
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(digest.iter().take(FINGERPRINT_BYTES).copied().collect::<Vec<u8>>())
}
