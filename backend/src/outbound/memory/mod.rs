//! In-memory adapters used when no database URL is configured.
//!
//! Each store keeps its rows behind a `tokio::sync::Mutex` and mimics the
//! constraints of the matching PostgreSQL schema: generated ids, unique
//! order numbers and idempotency keys, one cart line per album and session.

mod album_repository;
mod cart_repository;
mod order_repository;
mod session_token_repository;
mod user_repository;

pub use album_repository::InMemoryAlbumRepository;
pub use cart_repository::InMemoryCartRepository;
pub use order_repository::InMemoryOrderRepository;
pub use session_token_repository::InMemorySessionTokenRepository;
pub use user_repository::InMemoryUserRepository;

/// Next value of a serial column starting at 1.
fn next_id(counter: &mut i32) -> i32 {
    *counter = counter.saturating_add(1);
    *counter
}
