//! In-memory user accounts.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{NewUser, User, UserId, UserRecord};

use super::next_id;

#[derive(Default)]
struct UserTable {
    last_id: i32,
    rows: Vec<UserRecord>,
}

/// User store held in process memory with unique usernames.
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: Mutex<UserTable>,
}

impl InMemoryUserRepository {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserRepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .find(|record| record.user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .find(|record| record.user.id == id)
            .map(|record| record.user.clone()))
    }

    async fn list(&self) -> Result<Vec<User>, UserRepositoryError> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().map(|record| record.user.clone()).collect())
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut table = self.table.lock().await;
        if table
            .rows
            .iter()
            .any(|record| record.user.username == user.username)
        {
            return Err(UserRepositoryError::duplicate_username(
                user.username.as_str(),
            ));
        }
        let stored = User {
            id: UserId::new(next_id(&mut table.last_id)),
            username: user.username.clone(),
            role: user.role.clone(),
            created_at: Utc::now(),
        };
        table.rows.push(UserRecord {
            user: stored.clone(),
            password_hash: user.password_hash.clone(),
        });
        Ok(stored)
    }
}
