//! Token-based authentication for the users service.
//!
//! Tokens expire after a fixed TTL. Verification deletes expired tokens it
//! encounters, and refresh rotates a live token into a new one.

use std::sync::Arc;

use chrono::TimeDelta;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::password::{hash_password, verify_password};
use crate::domain::ports::{
    SessionTokenRepository, SessionTokenRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    AuthSession, Error, IssuedToken, LoginCredentials, NewUser, Role, SessionToken, User,
    UserProfile,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const INVALID_TOKEN: &str = "Invalid or expired token";

/// Username of the account created at start-up.
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

/// Authentication application service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn SessionTokenRepository>,
    clock: Arc<dyn Clock>,
    token_ttl: TimeDelta,
}

impl AuthService {
    /// Build the service; tokens live for `token_ttl`.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn SessionTokenRepository>,
        clock: Arc<dyn Clock>,
        token_ttl: TimeDelta,
    ) -> Self {
        Self {
            users,
            tokens,
            clock,
            token_ttl,
        }
    }

    /// Exchange credentials for a token. Unknown users and wrong passwords
    /// are indistinguishable to the caller.
    ///
    /// # Errors
    /// `unauthorized` for bad credentials, store failures otherwise.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<IssuedToken, Error> {
        let Some(record) = self
            .users
            .find_by_username(credentials.username())
            .await
            .map_err(map_user_error)?
        else {
            debug!(username = credentials.username(), "login for unknown user");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let matches = verify_password(credentials.password(), &record.password_hash)
            .map_err(|err| Error::internal(err.to_string()))?;
        if !matches {
            debug!(username = credentials.username(), "login with wrong password");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        let issued = self.issue(&record.user).await?;
        info!(user_id = %record.user.id, "user logged in");
        Ok(issued)
    }

    /// Revoke a token. Revoking an unknown token succeeds.
    ///
    /// # Errors
    /// Store failures.
    pub async fn logout(&self, token: &SessionToken) -> Result<(), Error> {
        let removed = self
            .tokens
            .delete(&token.digest())
            .await
            .map_err(map_token_error)?;
        debug!(removed, "logout processed");
        Ok(())
    }

    /// Resolve a token to its owner's profile.
    ///
    /// # Errors
    /// `unauthorized` for unknown or expired tokens.
    pub async fn verify(&self, token: &SessionToken) -> Result<UserProfile, Error> {
        self.live_session(token).await.map(|(_, user)| user.profile())
    }

    /// Replace a live token with a new one, revoking the old token.
    ///
    /// # Errors
    /// `unauthorized` for unknown or expired tokens.
    pub async fn refresh(&self, token: &SessionToken) -> Result<IssuedToken, Error> {
        let (session, user) = self.live_session(token).await?;
        let issued = self.issue(&user).await?;
        self.tokens
            .delete(&session.token_digest)
            .await
            .map_err(map_token_error)?;
        info!(user_id = %user.id, "token rotated");
        Ok(issued)
    }

    /// Every user, for administrators only.
    ///
    /// # Errors
    /// `unauthorized` for bad tokens, `forbidden` for non-admin users.
    pub async fn list_users(&self, token: &SessionToken) -> Result<Vec<User>, Error> {
        let (_, caller) = self.live_session(token).await?;
        if !caller.role.is_admin() {
            return Err(Error::forbidden("Admin access required"));
        }
        self.users.list().await.map_err(map_user_error)
    }

    /// Ensure the default administrator exists. An existing account keeps
    /// its current password.
    ///
    /// # Errors
    /// Hashing or store failures.
    pub async fn bootstrap_admin(&self, password: &str) -> Result<(), Error> {
        if self
            .users
            .find_by_username(BOOTSTRAP_ADMIN_USERNAME)
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            debug!("bootstrap admin already present");
            return Ok(());
        }
        let password_hash =
            hash_password(password).map_err(|err| Error::internal(err.to_string()))?;
        let new_user = NewUser {
            username: BOOTSTRAP_ADMIN_USERNAME.to_owned(),
            password_hash,
            role: Role::admin(),
        };
        match self.users.insert(&new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, "bootstrap admin created");
                Ok(())
            }
            Err(UserRepositoryError::DuplicateUsername { .. }) => Ok(()),
            Err(err) => Err(map_user_error(err)),
        }
    }

    /// Drop every expired token and report how many were removed.
    ///
    /// # Errors
    /// Store failures.
    pub async fn purge_expired(&self) -> Result<usize, Error> {
        let removed = self
            .tokens
            .delete_expired(self.clock.utc())
            .await
            .map_err(map_token_error)?;
        if removed > 0 {
            info!(removed, "expired tokens purged");
        }
        Ok(removed)
    }

    async fn issue(&self, user: &User) -> Result<IssuedToken, Error> {
        let token = SessionToken::generate();
        let created_at = self.clock.utc();
        let expires_at = created_at
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| Error::internal("token expiry overflowed"))?;
        let session = AuthSession {
            token_digest: token.digest(),
            user_id: user.id,
            created_at,
            expires_at,
        };
        self.tokens
            .insert(&session)
            .await
            .map_err(map_token_error)?;
        Ok(IssuedToken {
            token,
            expires_at,
            user: user.profile(),
        })
    }

    async fn live_session(&self, token: &SessionToken) -> Result<(AuthSession, User), Error> {
        let digest = token.digest();
        let session = self
            .tokens
            .find(&digest)
            .await
            .map_err(map_token_error)?
            .ok_or_else(|| Error::unauthorized(INVALID_TOKEN))?;
        if session.is_expired(self.clock.utc()) {
            if let Err(err) = self.tokens.delete(&digest).await {
                warn!(error = %err, "expired token not removed");
            }
            return Err(Error::unauthorized(INVALID_TOKEN));
        }
        let user = self
            .users
            .find_by_id(session.user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized(INVALID_TOKEN))?;
        Ok((session, user))
    }
}

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            warn!(%message, "user store unavailable");
            Error::service_unavailable("User store unavailable")
        }
        other => Error::internal(format!("user store failed: {other}")),
    }
}

fn map_token_error(error: SessionTokenRepositoryError) -> Error {
    match error {
        SessionTokenRepositoryError::Connection { message } => {
            warn!(%message, "token store unavailable");
            Error::service_unavailable("Token store unavailable")
        }
        SessionTokenRepositoryError::Query { message } => {
            Error::internal(format!("token store failed: {message}"))
        }
    }
}
