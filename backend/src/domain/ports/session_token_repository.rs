//! Port for bearer token session persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AuthSession, TokenDigest};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by token repository adapters.
    pub enum SessionTokenRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "token repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "token repository query failed: {message}",
    }
}

/// Token session storage keyed by token digest.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionTokenRepository: Send + Sync {
    /// Store a new session.
    async fn insert(&self, session: &AuthSession) -> Result<(), SessionTokenRepositoryError>;

    /// Fetch a session by digest.
    async fn find(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<AuthSession>, SessionTokenRepositoryError>;

    /// Delete a session; `false` when it did not exist.
    async fn delete(&self, digest: &TokenDigest) -> Result<bool, SessionTokenRepositoryError>;

    /// Delete sessions that expired at or before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>)
    -> Result<usize, SessionTokenRepositoryError>;
}
