//! File storage adapters.

mod local_cover_store;

pub use local_cover_store::{LocalCoverStore, PUBLIC_UPLOADS_PREFIX};
