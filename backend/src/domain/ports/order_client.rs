//! Port used by the cart service to persist orders.

use async_trait::async_trait;

use crate::domain::retry::Transient;
use crate::domain::{IdempotencyKey, OrderDraft, OrderReceipt};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order client adapters.
    pub enum OrderClientError {
        /// The order service answered with something other than `201 Created`.
        Status { status: u16, message: String } => "order service returned {status}: {message}",
        /// The order service could not be reached or timed out.
        Transport { message: String } => "order service unavailable: {message}",
        /// The order response could not be decoded.
        Decode { message: String } => "invalid order response: {message}",
    }
}

impl Transient for OrderClientError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Transport { .. } => true,
            Self::Decode { .. } => false,
        }
    }
}

/// Order creation over the network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderClient: Send + Sync {
    /// Create an order. Repeating the call with the same key and draft
    /// returns the original order instead of creating another.
    async fn create_order(
        &self,
        draft: &OrderDraft,
        idempotency_key: IdempotencyKey,
    ) -> Result<OrderReceipt, OrderClientError>;
}
