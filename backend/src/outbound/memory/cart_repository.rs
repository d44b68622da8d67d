//! In-memory cart lines.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::ports::{CartRepository, CartRepositoryError};
use crate::domain::{AlbumDetails, CartItem, CartItemId, CartSessionId, Quantity};

use super::next_id;

#[derive(Default)]
struct CartTable {
    last_id: i32,
    rows: Vec<CartItem>,
}

/// Cart store held in process memory.
///
/// Adding an album already in the session's cart increments the existing
/// line, like the unique `(session_id, album_id)` index does in PostgreSQL.
#[derive(Default)]
pub struct InMemoryCartRepository {
    table: Mutex<CartTable>,
}

impl InMemoryCartRepository {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn add(
        &self,
        session: &CartSessionId,
        album: &AlbumDetails,
        quantity: Quantity,
    ) -> Result<CartItem, CartRepositoryError> {
        let mut table = self.table.lock().await;
        if let Some(existing) = table
            .rows
            .iter_mut()
            .find(|row| row.session_id == *session && row.album.album_id == album.album_id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return Ok(existing.clone());
        }
        let item = CartItem {
            id: CartItemId::new(next_id(&mut table.last_id)),
            session_id: session.clone(),
            album: album.clone(),
            quantity,
            created_at: Utc::now(),
        };
        table.rows.push(item.clone());
        Ok(item)
    }

    async fn list(&self, session: &CartSessionId) -> Result<Vec<CartItem>, CartRepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .rev()
            .filter(|row| row.session_id == *session)
            .cloned()
            .collect())
    }

    async fn set_quantity(
        &self,
        session: &CartSessionId,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<bool, CartRepositoryError> {
        let mut table = self.table.lock().await;
        match table
            .rows
            .iter_mut()
            .find(|row| row.session_id == *session && row.id == item)
        {
            Some(row) => {
                row.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(
        &self,
        session: &CartSessionId,
        item: CartItemId,
    ) -> Result<bool, CartRepositoryError> {
        let mut table = self.table.lock().await;
        let before = table.rows.len();
        table
            .rows
            .retain(|row| !(row.session_id == *session && row.id == item));
        Ok(table.rows.len() < before)
    }

    async fn clear(&self, session: &CartSessionId) -> Result<usize, CartRepositoryError> {
        let mut table = self.table.lock().await;
        let before = table.rows.len();
        table.rows.retain(|row| row.session_id != *session);
        Ok(before - table.rows.len())
    }
}
