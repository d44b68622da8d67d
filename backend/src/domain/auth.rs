//! Authentication primitives: login credentials, bearer tokens, and stored
//! token sessions.
//!
//! Tokens are handed to clients once and only their SHA-256 digest is
//! persisted, so a leaked token table cannot be replayed.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{UserId, UserProfile};

const TOKEN_BYTES: usize = 32;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use storefront::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin ", "admin").unwrap();
/// assert_eq!(creds.username(), "admin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    ///
    /// # Errors
    /// Returns [`LoginValidationError`] when either value is blank.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for user lookups.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Raised when a presented token is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("token must not be empty")]
pub struct EmptyTokenError;

/// Opaque bearer token: 32 random bytes, hex encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    /// Mint a fresh token.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; TOKEN_BYTES]);
        rand::thread_rng().fill_bytes(bytes.as_mut_slice());
        Self(Zeroizing::new(hex::encode(bytes.as_slice())))
    }

    /// Accept a token presented by a client.
    ///
    /// # Errors
    /// Returns [`EmptyTokenError`] for blank input.
    pub fn parse(raw: &str) -> Result<Self, EmptyTokenError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyTokenError);
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// Token text to hand back to the client.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Digest used as the storage key.
    #[must_use]
    pub fn digest(&self) -> TokenDigest {
        TokenDigest(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Hex SHA-256 digest of a [`SessionToken`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
    /// Wrap a stored digest.
    #[must_use]
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the digest text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Persisted token session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Storage key.
    pub token_digest: TokenDigest,
    /// Owning user.
    pub user_id: UserId,
    /// Issue time.
    pub created_at: DateTime<Utc>,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the session is no longer valid at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Token handed back on login or refresh.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Bearer token.
    pub token: SessionToken,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
    /// Owner profile.
    pub user: UserProfile,
}
