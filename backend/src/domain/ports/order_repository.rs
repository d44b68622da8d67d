//! Port for order persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    CustomerDetails, IdempotencyKey, Order, OrderId, OrderLine, OrderNumber, OrderStatus,
    OrderSummary, PayloadHash, Price,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "order repository query failed: {message}",
        /// The generated order number is already taken.
        DuplicateOrderNumber { order_number: String } => "order number already exists: {order_number}",
        /// Another order already claimed the idempotency key.
        DuplicateIdempotencyKey { key: String } => "idempotency key already used: {key}",
    }
}

/// Idempotency key and payload fingerprint stored with an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyRecord {
    /// Client key.
    pub key: IdempotencyKey,
    /// Hash of the request body.
    pub payload_hash: PayloadHash,
}

/// Order awaiting insertion; lines are written in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Generated order number.
    pub order_number: OrderNumber,
    /// Originating cart session.
    pub session_id: Option<String>,
    /// Order total.
    pub total: Price,
    /// Initial status.
    pub status: OrderStatus,
    /// Purchased lines.
    pub items: Vec<OrderLine>,
    /// Checkout details.
    pub customer: Option<CustomerDetails>,
    /// Deduplication data.
    pub idempotency: Option<IdempotencyRecord>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Order previously stored under an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOrder {
    /// The order.
    pub order: Order,
    /// Hash of the request that created it.
    pub payload_hash: PayloadHash,
}

/// Durable order storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert an order and its lines atomically.
    async fn insert(&self, order: &NewOrder) -> Result<Order, OrderRepositoryError>;

    /// Look up the order created under `key`.
    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<StoredOrder>, OrderRepositoryError>;

    /// Every order, newest first.
    async fn list(&self) -> Result<Vec<OrderSummary>, OrderRepositoryError>;

    /// Fetch one order with its lines.
    async fn find(&self, id: OrderId) -> Result<Option<Order>, OrderRepositoryError>;

    /// Overwrite an order's status; `false` when the order does not exist.
    async fn update_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<bool, OrderRepositoryError>;
}
