//! Diesel table definitions for the storefront databases.
//!
//! Every service owns its own database; the tables below are grouped by the
//! migration set that creates them under `backend/migrations/<service>`.
//! They must match those migrations exactly.

diesel::table! {
    /// Catalogue entries (catalog service).
    albums (id) {
        id -> Int4,
        name -> Varchar,
        artist -> Varchar,
        /// Unit price in cents.
        price_cents -> Int8,
        /// External URL or `/static/uploads/<file>`.
        cover_url -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Cart lines (cart service), unique per `(session_id, album_id)`.
    cart_items (id) {
        id -> Int4,
        session_id -> Varchar,
        album_id -> Int4,
        album_name -> Varchar,
        artist -> Varchar,
        price_cents -> Int8,
        cover_url -> Nullable<Text>,
        quantity -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Orders (order service).
    orders (id) {
        id -> Int4,
        order_number -> Varchar,
        session_id -> Nullable<Varchar>,
        total_cents -> Int8,
        status -> Varchar,
        /// Shipping, billing, and payment summary.
        customer_details -> Nullable<Jsonb>,
        idempotency_key -> Nullable<Uuid>,
        /// SHA-256 of the canonical request body.
        payload_hash -> Nullable<Bytea>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Order lines (order service).
    order_items (id) {
        id -> Int4,
        order_id -> Int4,
        album_id -> Int4,
        album_name -> Varchar,
        artist -> Varchar,
        price_cents -> Int8,
        quantity -> Int4,
    }
}

diesel::table! {
    /// Accounts (users service).
    users (id) {
        id -> Int4,
        username -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Login sessions (users service), keyed by token digest.
    session_tokens (token_digest) {
        token_digest -> Varchar,
        user_id -> Int4,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
    }
}

diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(session_tokens -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(orders, order_items);
diesel::allow_tables_to_appear_in_same_query!(users, session_tokens);
