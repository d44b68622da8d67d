//! Idempotency keys and payload fingerprints for order creation.
//!
//! A checkout form carries a client-generated key. The cart service forwards
//! it as the `Idempotency-Key` header and the order service stores it with a
//! SHA-256 hash of the request body, so a retried submission replays the
//! first order instead of creating a second one.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Header carrying the idempotency key between services.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyKeyValidationError {
    /// The key string was empty.
    #[error("idempotency key must not be empty")]
    EmptyKey,
    /// The key string was not a valid UUID.
    #[error("idempotency key must be a valid UUID")]
    InvalidKey,
}

/// Client-provided idempotency key (UUID).
///
/// # Examples
/// ```
/// use storefront::domain::IdempotencyKey;
///
/// let key = IdempotencyKey::new("550e8400-e29b-41d4-a716-446655440000").unwrap();
/// assert_eq!(key.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// assert!(IdempotencyKey::new("nope").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Validate and construct a key from text.
    ///
    /// # Errors
    /// Returns [`IdempotencyKeyValidationError`] for empty or non-UUID input.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| IdempotencyKeyValidationError::InvalidKey)
    }

    /// Wrap a stored UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random key.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised while fingerprinting a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadHashError {
    /// The stored byte slice had an incorrect length.
    #[error("payload hash must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        actual: usize,
    },
    /// The payload could not be serialised.
    #[error("failed to serialise payload: {message}")]
    Serialization {
        /// Serializer message.
        message: String,
    },
}

/// SHA-256 hash of a request payload's JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Hash the JSON serialisation of `payload`. Struct field order is fixed
    /// by the type, so equal payloads hash equally.
    ///
    /// # Errors
    /// Returns [`PayloadHashError::Serialization`] when serialisation fails.
    pub fn of<T: Serialize>(payload: &T) -> Result<Self, PayloadHashError> {
        let bytes = serde_json::to_vec(payload).map_err(|err| PayloadHashError::Serialization {
            message: err.to_string(),
        })?;
        Ok(Self(Sha256::digest(&bytes).into()))
    }

    /// Rebuild a hash from stored bytes.
    ///
    /// # Errors
    /// Returns [`PayloadHashError::InvalidLength`] unless exactly 32 bytes
    /// are supplied.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, PayloadHashError> {
        <[u8; 32]>::try_from(bytes)
            .map(Self)
            .map_err(|_| PayloadHashError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })
    }

    /// Raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
