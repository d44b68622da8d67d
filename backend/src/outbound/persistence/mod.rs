//! PostgreSQL persistence adapters using Diesel and `diesel-async`.
//!
//! Repositories are thin: they translate between row structs
//! (`models.rs`, `schema.rs`) and domain types and map database failures
//! onto the port errors. Each service runs its own migration set from
//! `backend/migrations/<service>` at start-up.
//!
//! ```no_run
//! use storefront::outbound::persistence::{DbPool, DieselOrderRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/orders")).await?;
//! let orders = DieselOrderRepository::new(pool);
//! # let _ = orders;
//! # Ok(())
//! # }
//! ```

mod diesel_album_repository;
mod diesel_cart_repository;
mod diesel_order_repository;
mod diesel_session_token_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_album_repository::DieselAlbumRepository;
pub use diesel_cart_repository::DieselCartRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_session_token_repository::DieselSessionTokenRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, MigrationSet, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
