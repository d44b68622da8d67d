//! PostgreSQL-backed `CartRepository`.
//!
//! Repeated adds of the same album rely on the
//! `cart_items_session_album_key` unique constraint: the insert becomes an
//! atomic quantity increment via `ON CONFLICT DO UPDATE`, saturating at
//! `i32::MAX` like the in-memory store.

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CartRepository, CartRepositoryError};
use crate::domain::{
    AlbumDetails, AlbumId, CartItem, CartItemId, CartSessionId, Price, Quantity,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CartItemRow, NewCartItemRow};
use super::pool::{DbPool, PoolError};
use super::schema::cart_items;

/// Widened to `bigint` so the sum cannot overflow before it is clamped.
const SATURATING_QUANTITY_SUM: &str =
    "LEAST(cart_items.quantity::bigint + EXCLUDED.quantity, 2147483647)::integer";

/// Diesel implementation of the cart store.
#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    /// Create a repository over `pool`.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> CartRepositoryError {
    map_pool_error(error, CartRepositoryError::connection)
}

fn diesel_error(error: &diesel::result::Error) -> CartRepositoryError {
    map_diesel_error(
        error,
        CartRepositoryError::query,
        CartRepositoryError::connection,
    )
}

fn quantity_column(quantity: Quantity) -> Result<i32, CartRepositoryError> {
    i32::try_from(quantity.get())
        .map_err(|_| CartRepositoryError::query("quantity exceeds the column range"))
}

fn row_to_item(row: CartItemRow) -> Result<CartItem, CartRepositoryError> {
    let corrupt = |field: &str, detail: String| {
        CartRepositoryError::query(format!("cart item {} has an invalid {field}: {detail}", row.id))
    };
    let session_id =
        CartSessionId::parse(&row.session_id).map_err(|err| corrupt("session id", err.to_string()))?;
    let price = Price::from_cents(row.price_cents).map_err(|err| corrupt("price", err.to_string()))?;
    let quantity = Quantity::new(i64::from(row.quantity))
        .map_err(|err| corrupt("quantity", err.to_string()))?;
    Ok(CartItem {
        id: CartItemId::new(row.id),
        session_id,
        album: AlbumDetails {
            album_id: AlbumId::new(row.album_id),
            album_name: row.album_name,
            artist: row.artist,
            price,
            cover_url: row.cover_url,
        },
        quantity,
        created_at: row.created_at,
    })
}

#[async_trait]
impl CartRepository for DieselCartRepository {
    async fn add(
        &self,
        session: &CartSessionId,
        album: &AlbumDetails,
        quantity: Quantity,
    ) -> Result<CartItem, CartRepositoryError> {
        let price_cents = album
            .price
            .try_to_cents()
            .map_err(|err| CartRepositoryError::query(err.to_string()))?;
        let new_row = NewCartItemRow {
            session_id: session.as_str(),
            album_id: album.album_id.get(),
            album_name: &album.album_name,
            artist: &album.artist,
            price_cents,
            cover_url: album.cover_url.as_deref(),
            quantity: quantity_column(quantity)?,
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: CartItemRow = diesel::insert_into(cart_items::table)
            .values(&new_row)
            .on_conflict((cart_items::session_id, cart_items::album_id))
            .do_update()
            .set(cart_items::quantity.eq(sql::<Integer>(SATURATING_QUANTITY_SUM)))
            .returning(CartItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        row_to_item(row)
    }

    async fn list(&self, session: &CartSessionId) -> Result<Vec<CartItem>, CartRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<CartItemRow> = cart_items::table
            .filter(cart_items::session_id.eq(session.as_str()))
            .order((cart_items::created_at.desc(), cart_items::id.desc()))
            .select(CartItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        rows.into_iter().map(row_to_item).collect()
    }

    async fn set_quantity(
        &self,
        session: &CartSessionId,
        item: CartItemId,
        quantity: Quantity,
    ) -> Result<bool, CartRepositoryError> {
        let quantity = quantity_column(quantity)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            cart_items::table
                .filter(cart_items::id.eq(item.get()))
                .filter(cart_items::session_id.eq(session.as_str())),
        )
        .set(cart_items::quantity.eq(quantity))
        .execute(&mut conn)
        .await
        .map_err(|err| diesel_error(&err))?;
        Ok(updated > 0)
    }

    async fn remove(
        &self,
        session: &CartSessionId,
        item: CartItemId,
    ) -> Result<bool, CartRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(
            cart_items::table
                .filter(cart_items::id.eq(item.get()))
                .filter(cart_items::session_id.eq(session.as_str())),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| diesel_error(&err))?;
        Ok(deleted > 0)
    }

    async fn clear(&self, session: &CartSessionId) -> Result<usize, CartRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::delete(cart_items::table.filter(cart_items::session_id.eq(session.as_str())))
            .execute(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))
    }
}
