//! In-memory login sessions keyed by token digest.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::ports::{SessionTokenRepository, SessionTokenRepositoryError};
use crate::domain::{AuthSession, TokenDigest};

/// Token store held in process memory.
#[derive(Default)]
pub struct InMemorySessionTokenRepository {
    sessions: Mutex<HashMap<TokenDigest, AuthSession>>,
}

impl InMemorySessionTokenRepository {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionTokenRepository for InMemorySessionTokenRepository {
    async fn insert(&self, session: &AuthSession) -> Result<(), SessionTokenRepositoryError> {
        self.sessions
            .lock()
            .await
            .insert(session.token_digest.clone(), session.clone());
        Ok(())
    }

    async fn find(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<AuthSession>, SessionTokenRepositoryError> {
        Ok(self.sessions.lock().await.get(digest).cloned())
    }

    async fn delete(&self, digest: &TokenDigest) -> Result<bool, SessionTokenRepositoryError> {
        Ok(self.sessions.lock().await.remove(digest).is_some())
    }

    async fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, SessionTokenRepositoryError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok(before - sessions.len())
    }
}
