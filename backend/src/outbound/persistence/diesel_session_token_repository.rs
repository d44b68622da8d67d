//! PostgreSQL-backed `SessionTokenRepository`.
//!
//! Only token digests are stored; a leaked table does not yield usable
//! bearer tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{SessionTokenRepository, SessionTokenRepositoryError};
use crate::domain::{AuthSession, TokenDigest, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::SessionTokenRow;
use super::pool::{DbPool, PoolError};
use super::schema::session_tokens;

/// Diesel implementation of the login session store.
#[derive(Clone)]
pub struct DieselSessionTokenRepository {
    pool: DbPool,
}

impl DieselSessionTokenRepository {
    /// Create a repository over `pool`.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> SessionTokenRepositoryError {
    map_pool_error(error, SessionTokenRepositoryError::connection)
}

fn diesel_error(error: &diesel::result::Error) -> SessionTokenRepositoryError {
    map_diesel_error(
        error,
        SessionTokenRepositoryError::query,
        SessionTokenRepositoryError::connection,
    )
}

impl From<SessionTokenRow> for AuthSession {
    fn from(row: SessionTokenRow) -> Self {
        Self {
            token_digest: TokenDigest::from_stored(row.token_digest),
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

impl From<&AuthSession> for SessionTokenRow {
    fn from(session: &AuthSession) -> Self {
        Self {
            token_digest: session.token_digest.as_str().to_owned(),
            user_id: session.user_id.get(),
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

#[async_trait]
impl SessionTokenRepository for DieselSessionTokenRepository {
    async fn insert(&self, session: &AuthSession) -> Result<(), SessionTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(session_tokens::table)
            .values(SessionTokenRow::from(session))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| diesel_error(&err))
    }

    async fn find(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<AuthSession>, SessionTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<SessionTokenRow> = session_tokens::table
            .find(digest.as_str())
            .select(SessionTokenRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        Ok(row.map(AuthSession::from))
    }

    async fn delete(&self, digest: &TokenDigest) -> Result<bool, SessionTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(session_tokens::table.find(digest.as_str()))
            .execute(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        Ok(deleted > 0)
    }

    async fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, SessionTokenRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(
            session_tokens::table.filter(session_tokens::expires_at.le(now)),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| diesel_error(&err))?;
        debug!(deleted, cutoff = %now, "purged expired session tokens");
        Ok(deleted)
    }
}
