//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process stores for development and tests
//! - **http**: reqwest clients for calls to the other services
//! - **storage**: cover uploads on the local filesystem
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod http;
pub mod memory;
pub mod persistence;
pub mod storage;
