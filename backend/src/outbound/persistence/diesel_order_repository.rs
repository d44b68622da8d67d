//! PostgreSQL-backed `OrderRepository`.
//!
//! An order and its lines are written in one transaction. Unique violations
//! on `orders_order_number_key` and `orders_idempotency_key_key` surface as
//! the dedicated port errors so the service can retry or replay.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{NewOrder, OrderRepository, OrderRepositoryError, StoredOrder};
use crate::domain::{
    AlbumId, CustomerDetails, IdempotencyKey, Order, OrderId, OrderLine, OrderNumber,
    OrderStatus, OrderSummary, PayloadHash, Price, Quantity,
};

use super::error_mapping::{map_diesel_error, map_pool_error, violated_unique_constraint};
use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};
use super::pool::{DbPool, PoolError};
use super::schema::{order_items, orders};

const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";
const IDEMPOTENCY_KEY_CONSTRAINT: &str = "orders_idempotency_key_key";

/// Diesel implementation of the order store.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a repository over `pool`.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> OrderRepositoryError {
    map_pool_error(error, OrderRepositoryError::connection)
}

fn diesel_error(error: &diesel::result::Error) -> OrderRepositoryError {
    map_diesel_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

fn insert_error(error: &diesel::result::Error, order: &NewOrder) -> OrderRepositoryError {
    match violated_unique_constraint(error) {
        Some(ORDER_NUMBER_CONSTRAINT) => {
            OrderRepositoryError::duplicate_order_number(order.order_number.as_str())
        }
        Some(IDEMPOTENCY_KEY_CONSTRAINT) => OrderRepositoryError::duplicate_idempotency_key(
            order
                .idempotency
                .as_ref()
                .map(|record| record.key.to_string())
                .unwrap_or_default(),
        ),
        _ => diesel_error(error),
    }
}

fn cents(price: Price) -> Result<i64, OrderRepositoryError> {
    price
        .try_to_cents()
        .map_err(|err| OrderRepositoryError::query(err.to_string()))
}

fn line_rows(order: &NewOrder) -> Result<Vec<NewOrderItemRow<'_>>, OrderRepositoryError> {
    order
        .items
        .iter()
        .map(|line| {
            Ok::<_, OrderRepositoryError>(NewOrderItemRow {
                order_id: 0,
                album_id: line.album_id.get(),
                album_name: &line.album_name,
                artist: &line.artist,
                price_cents: cents(line.price)?,
                quantity: i32::try_from(line.quantity.get()).map_err(|_| {
                    OrderRepositoryError::query("quantity exceeds the column range")
                })?,
            })
        })
        .collect()
}

fn corrupt(order_id: i32, field: &str, detail: impl std::fmt::Display) -> OrderRepositoryError {
    OrderRepositoryError::query(format!("order {order_id} has an invalid {field}: {detail}"))
}

fn row_to_line(row: OrderItemRow) -> Result<OrderLine, OrderRepositoryError> {
    let price = Price::from_cents(row.price_cents)
        .map_err(|err| corrupt(row.order_id, "line price", err))?;
    let quantity = Quantity::new(i64::from(row.quantity))
        .map_err(|err| corrupt(row.order_id, "line quantity", err))?;
    Ok(OrderLine {
        album_id: AlbumId::new(row.album_id),
        album_name: row.album_name,
        artist: row.artist,
        price,
        quantity,
    })
}

fn assemble(row: OrderRow, lines: Vec<OrderItemRow>) -> Result<Order, OrderRepositoryError> {
    let total_amount =
        Price::from_cents(row.total_cents).map_err(|err| corrupt(row.id, "total", err))?;
    let customer = row
        .customer_details
        .map(serde_json::from_value::<CustomerDetails>)
        .transpose()
        .map_err(|err| corrupt(row.id, "customer details", err))?;
    let items = lines
        .into_iter()
        .map(row_to_line)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Order {
        id: OrderId::new(row.id),
        order_number: OrderNumber::from_stored(row.order_number),
        session_id: row.session_id,
        total_amount,
        status: OrderStatus::from_stored(row.status),
        created_at: row.created_at,
        items,
        customer,
    })
}

async fn load_lines(
    conn: &mut AsyncPgConnection,
    order_id: i32,
) -> Result<Vec<OrderItemRow>, OrderRepositoryError> {
    order_items::table
        .filter(order_items::order_id.eq(order_id))
        .order(order_items::id.asc())
        .select(OrderItemRow::as_select())
        .load(conn)
        .await
        .map_err(|err| diesel_error(&err))
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn insert(&self, order: &NewOrder) -> Result<Order, OrderRepositoryError> {
        let customer_details = order
            .customer
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| OrderRepositoryError::query(err.to_string()))?;
        let new_order = NewOrderRow {
            order_number: order.order_number.as_str(),
            session_id: order.session_id.as_deref(),
            total_cents: cents(order.total)?,
            status: order.status.as_str(),
            customer_details,
            idempotency_key: order.idempotency.as_ref().map(|record| *record.key.as_uuid()),
            payload_hash: order
                .idempotency
                .as_ref()
                .map(|record| record.payload_hash.as_bytes().as_slice()),
            created_at: order.created_at,
        };
        let mut lines = line_rows(order)?;

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (order_row, stored_lines) = conn
            .transaction(|conn| {
                async move {
                    let order_row: OrderRow = diesel::insert_into(orders::table)
                        .values(&new_order)
                        .returning(OrderRow::as_returning())
                        .get_result(conn)
                        .await?;
                    for line in &mut lines {
                        line.order_id = order_row.id;
                    }
                    let stored_lines: Vec<OrderItemRow> =
                        diesel::insert_into(order_items::table)
                            .values(&lines)
                            .returning(OrderItemRow::as_returning())
                            .get_results(conn)
                            .await?;
                    Ok::<_, diesel::result::Error>((order_row, stored_lines))
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| insert_error(&err, order))?;
        assemble(order_row, stored_lines)
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<StoredOrder>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<OrderRow> = orders::table
            .filter(orders::idempotency_key.eq(key.as_uuid()))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let payload_hash = row
            .payload_hash
            .as_deref()
            .map(PayloadHash::try_from_bytes)
            .transpose()
            .map_err(|err| corrupt(row.id, "payload hash", err))?
            .ok_or_else(|| corrupt(row.id, "payload hash", "missing"))?;
        let lines = load_lines(&mut conn, row.id).await?;
        Ok(Some(StoredOrder {
            order: assemble(row, lines)?,
            payload_hash,
        }))
    }

    async fn list(&self) -> Result<Vec<OrderSummary>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<OrderRow> = orders::table
            .order((orders::created_at.desc(), orders::id.desc()))
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        let counts: HashMap<i32, i64> = order_items::table
            .group_by(order_items::order_id)
            .select((order_items::order_id, diesel::dsl::count_star()))
            .load::<(i32, i64)>(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?
            .into_iter()
            .collect();

        rows.into_iter()
            .map(|row| {
                let item_count = counts.get(&row.id).copied().unwrap_or_default();
                Ok::<_, OrderRepositoryError>(OrderSummary {
                    id: OrderId::new(row.id),
                    total_amount: Price::from_cents(row.total_cents)
                        .map_err(|err| corrupt(row.id, "total", err))?,
                    item_count: u32::try_from(item_count).unwrap_or(u32::MAX),
                    order_number: OrderNumber::from_stored(row.order_number),
                    status: OrderStatus::from_stored(row.status),
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<OrderRow> = orders::table
            .find(id.get())
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        match row {
            Some(row) => {
                let lines = load_lines(&mut conn, row.id).await?;
                assemble(row, lines).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<bool, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(orders::table.find(id.get()))
            .set(orders::status.eq(status.as_str()))
            .execute(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        Ok(updated > 0)
    }
}
