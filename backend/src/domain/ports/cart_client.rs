//! Port used by the catalogue service to forward add-to-cart requests.

use async_trait::async_trait;

use crate::domain::retry::Transient;
use crate::domain::{AlbumDetails, CartSessionId, Quantity};

use super::define_port_error;

define_port_error! {
    /// Errors raised by cart client adapters.
    pub enum CartClientError {
        /// The cart service answered with a non-success status.
        Status { status: u16, message: String } => "cart service returned {status}: {message}",
        /// The cart service could not be reached.
        Transport { message: String } => "cart service unavailable: {message}",
        /// The cart response could not be decoded.
        Decode { message: String } => "invalid cart response: {message}",
    }
}

impl Transient for CartClientError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Transport { .. } => true,
            Self::Decode { .. } => false,
        }
    }
}

/// Add-to-cart request carrying the album details the catalogue already has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartAddRequest {
    /// Cart session to add to; the cart service mints one when absent.
    pub session_id: Option<CartSessionId>,
    /// Album details to copy into the line.
    pub album: AlbumDetails,
    /// Units to add.
    pub quantity: Quantity,
}

/// Cart service acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartAddReceipt {
    /// Session the line was added under.
    pub session_id: CartSessionId,
    /// Human-readable confirmation.
    pub message: String,
}

/// Write access to carts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartClient: Send + Sync {
    /// Add an album to a cart.
    async fn add_to_cart(&self, request: &CartAddRequest)
    -> Result<CartAddReceipt, CartClientError>;
}
