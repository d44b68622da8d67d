//! Port used by the catalogue service to verify admin tokens.

use async_trait::async_trait;

use crate::domain::retry::Transient;
use crate::domain::{SessionToken, UserProfile};

use super::define_port_error;

define_port_error! {
    /// Errors raised by auth client adapters.
    pub enum AuthClientError {
        /// The users service answered with an unexpected status.
        Status { status: u16 } => "users service returned {status}",
        /// The users service could not be reached.
        Transport { message: String } => "users service unavailable: {message}",
        /// The users response could not be decoded.
        Decode { message: String } => "invalid users response: {message}",
    }
}

impl Transient for AuthClientError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Status { status } => *status >= 500,
            Self::Transport { .. } => true,
            Self::Decode { .. } => false,
        }
    }
}

/// Token verification against the users service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Resolve a token to its owner; `None` when the token is unknown or
    /// expired.
    async fn verify(&self, token: &SessionToken) -> Result<Option<UserProfile>, AuthClientError>;
}
