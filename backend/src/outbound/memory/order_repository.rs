//! In-memory order book.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{
    IdempotencyRecord, NewOrder, OrderRepository, OrderRepositoryError, StoredOrder,
};
use crate::domain::{IdempotencyKey, Order, OrderId, OrderStatus, OrderSummary};

use super::next_id;

struct OrderRow {
    order: Order,
    idempotency: Option<IdempotencyRecord>,
}

#[derive(Default)]
struct OrderTable {
    last_id: i32,
    rows: Vec<OrderRow>,
}

/// Order store held in process memory.
///
/// Enforces the same uniqueness rules as the `orders` table: order numbers
/// and idempotency keys may each appear once.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    table: Mutex<OrderTable>,
}

impl InMemoryOrderRepository {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &NewOrder) -> Result<Order, OrderRepositoryError> {
        let mut table = self.table.lock().await;
        if table
            .rows
            .iter()
            .any(|row| row.order.order_number == order.order_number)
        {
            return Err(OrderRepositoryError::duplicate_order_number(
                order.order_number.as_str(),
            ));
        }
        if let Some(record) = &order.idempotency {
            let taken = table.rows.iter().any(|row| {
                row.idempotency
                    .as_ref()
                    .is_some_and(|existing| existing.key == record.key)
            });
            if taken {
                return Err(OrderRepositoryError::duplicate_idempotency_key(
                    record.key.to_string(),
                ));
            }
        }

        let stored = Order {
            id: OrderId::new(next_id(&mut table.last_id)),
            order_number: order.order_number.clone(),
            session_id: order.session_id.clone(),
            total_amount: order.total,
            status: order.status.clone(),
            created_at: order.created_at,
            items: order.items.clone(),
            customer: order.customer.clone(),
        };
        table.rows.push(OrderRow {
            order: stored.clone(),
            idempotency: order.idempotency.clone(),
        });
        Ok(stored)
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<StoredOrder>, OrderRepositoryError> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().find_map(|row| {
            row.idempotency
                .as_ref()
                .filter(|record| record.key == *key)
                .map(|record| StoredOrder {
                    order: row.order.clone(),
                    payload_hash: record.payload_hash.clone(),
                })
        }))
    }

    async fn list(&self) -> Result<Vec<OrderSummary>, OrderRepositoryError> {
        let table = self.table.lock().await;
        let mut summaries: Vec<_> = table.rows.iter().map(|row| row.order.summary()).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .find(|row| row.order.id == id)
            .map(|row| row.order.clone()))
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<bool, OrderRepositoryError> {
        let mut table = self.table.lock().await;
        match table.rows.iter_mut().find(|row| row.order.id == id) {
            Some(row) => {
                row.order.status = status.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
