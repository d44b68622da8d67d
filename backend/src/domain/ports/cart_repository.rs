//! Port for cart line persistence.

use async_trait::async_trait;

use crate::domain::{AlbumDetails, CartItem, CartItemId, CartSessionId, Quantity};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by cart repository adapters.
    pub enum CartRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "cart repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "cart repository query failed: {message}",
    }
}

/// Cart storage keyed by session identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Add `quantity` units of an album. When the session already holds the
    /// album, the quantities are summed atomically and the stored details
    /// are left untouched.
    async fn add(
        &self,
        session: &CartSessionId,
        album: &AlbumDetails,
        quantity: Quantity,
    ) -> Result<CartItem, CartRepositoryError>;

    /// Lines for a session, newest first.
    async fn list(&self, session: &CartSessionId) -> Result<Vec<CartItem>, CartRepositoryError>;

    /// Overwrite a line's quantity; `false` when no such line exists for the
    /// session.
    async fn set_quantity(
        &self,
        session: &CartSessionId,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<bool, CartRepositoryError>;

    /// Delete one line; `false` when no such line exists for the session.
    async fn remove(
        &self,
        session: &CartSessionId,
        item: CartItemId,
    ) -> Result<bool, CartRepositoryError>;

    /// Delete every line for a session and return how many were removed.
    async fn clear(&self, session: &CartSessionId) -> Result<usize, CartRepositoryError>;
}
