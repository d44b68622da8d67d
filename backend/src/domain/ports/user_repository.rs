//! Port for user account persistence.

use async_trait::async_trait;

use crate::domain::{NewUser, User, UserId, UserRecord};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The username is already registered.
        DuplicateUsername { username: String } => "username already exists: {username}",
    }
}

/// User account storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user and password hash by username.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Every user ordered by identifier.
    async fn list(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Insert a user.
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError>;
}
