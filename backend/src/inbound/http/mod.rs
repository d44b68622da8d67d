//! HTTP inbound adapter for the four storefront services.
//!
//! Each service module exposes a `configure` function registering its
//! routes; [`crate::server`] decides which ones a binary mounts.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod health;
pub mod idempotency;
pub mod orders;
pub mod redirect;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod views;

pub use error::ApiResult;
