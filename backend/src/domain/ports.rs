//! Domain ports: traits implemented by outbound adapters.
//!
//! Repositories cover each service's own store; clients cover the
//! synchronous HTTP calls between services.

mod macros;

pub(crate) use macros::define_port_error;

mod album_repository;
mod auth_client;
mod cart_client;
mod cart_repository;
mod catalog_client;
mod cover_store;
mod order_client;
mod order_repository;
mod session_token_repository;
mod user_repository;

#[cfg(test)]
pub use album_repository::MockAlbumRepository;
pub use album_repository::{AlbumRepository, AlbumRepositoryError};
#[cfg(test)]
pub use auth_client::MockAuthClient;
pub use auth_client::{AuthClient, AuthClientError};
#[cfg(test)]
pub use cart_client::MockCartClient;
pub use cart_client::{CartAddReceipt, CartAddRequest, CartClient, CartClientError};
#[cfg(test)]
pub use cart_repository::MockCartRepository;
pub use cart_repository::{CartRepository, CartRepositoryError};
#[cfg(test)]
pub use catalog_client::MockCatalogClient;
pub use catalog_client::{CatalogClient, CatalogClientError};
#[cfg(test)]
pub use cover_store::MockCoverStore;
pub use cover_store::{CoverStore, CoverStoreError};
#[cfg(test)]
pub use order_client::MockOrderClient;
pub use order_client::{OrderClient, OrderClientError};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{
    IdempotencyRecord, NewOrder, OrderRepository, OrderRepositoryError, StoredOrder,
};
#[cfg(test)]
pub use session_token_repository::MockSessionTokenRepository;
pub use session_token_repository::{SessionTokenRepository, SessionTokenRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
