//! Internal Diesel row structs.
//!
//! Rows never leave the persistence layer; repositories convert them into
//! domain types and report malformed stored values as query errors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{albums, cart_items, order_items, orders, session_tokens, users};

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = albums)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AlbumRow {
    pub id: i32,
    pub name: String,
    pub artist: String,
    pub price_cents: i64,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = albums)]
pub(crate) struct NewAlbumRow<'a> {
    pub name: &'a str,
    pub artist: &'a str,
    pub price_cents: i64,
    pub cover_url: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CartItemRow {
    pub id: i32,
    pub session_id: String,
    pub album_id: i32,
    pub album_name: String,
    pub artist: String,
    pub price_cents: i64,
    pub cover_url: Option<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cart_items)]
pub(crate) struct NewCartItemRow<'a> {
    pub session_id: &'a str,
    pub album_id: i32,
    pub album_name: &'a str,
    pub artist: &'a str,
    pub price_cents: i64,
    pub cover_url: Option<&'a str>,
    pub quantity: i32,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: i32,
    pub order_number: String,
    pub session_id: Option<String>,
    pub total_cents: i64,
    pub status: String,
    pub customer_details: Option<serde_json::Value>,
    pub payload_hash: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub(crate) struct NewOrderRow<'a> {
    pub order_number: &'a str,
    pub session_id: Option<&'a str>,
    pub total_cents: i64,
    pub status: &'a str,
    pub customer_details: Option<serde_json::Value>,
    pub idempotency_key: Option<Uuid>,
    pub payload_hash: Option<&'a [u8]>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderItemRow {
    pub order_id: i32,
    pub album_id: i32,
    pub album_name: String,
    pub artist: String,
    pub price_cents: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_items)]
pub(crate) struct NewOrderItemRow<'a> {
    pub order_id: i32,
    pub album_id: i32,
    pub album_name: &'a str,
    pub artist: &'a str,
    pub price_cents: i64,
    pub quantity: i32,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = session_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SessionTokenRow {
    pub token_digest: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
