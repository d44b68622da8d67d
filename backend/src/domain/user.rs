//! User accounts and roles.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier assigned to a user by the users store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-text role. Only `admin` carries privileges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Name of the privileged role.
    pub const ADMIN: &'static str = "admin";
    /// Name of the default role.
    pub const USER: &'static str = "user";

    /// Administrator role.
    #[must_use]
    pub fn admin() -> Self {
        Self(Self::ADMIN.to_owned())
    }

    /// Wrap a stored role.
    #[must_use]
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Whether the role grants administrative actions.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    /// Borrow the role text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Role {
    fn default() -> Self {
        Self(Self::USER.to_owned())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public profile returned by login and verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    /// Identifier.
    #[schema(value_type = i32, example = 1)]
    pub id: UserId,
    /// Unique username.
    #[schema(example = "admin")]
    pub username: String,
    /// Role name.
    #[schema(value_type = String, example = "admin")]
    pub role: Role,
}

/// User listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Identifier.
    #[schema(value_type = i32, example = 1)]
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Role name.
    #[schema(value_type = String)]
    pub role: Role,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Profile view without timestamps.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            role: self.role.clone(),
        }
    }
}

/// Stored user with credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Account fields.
    pub user: User,
    /// Argon2id PHC string.
    pub password_hash: String,
}

/// User awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique username.
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Role name.
    pub role: Role,
}
