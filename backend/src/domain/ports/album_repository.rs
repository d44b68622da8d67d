//! Port for album persistence.

use async_trait::async_trait;

use crate::domain::{Album, AlbumId, NewAlbum};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by album repository adapters.
    pub enum AlbumRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "album repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "album repository query failed: {message}",
    }
}

/// Album storage owned by the catalogue service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// Every album ordered by identifier.
    async fn list(&self) -> Result<Vec<Album>, AlbumRepositoryError>;

    /// Fetch one album.
    async fn find(&self, id: AlbumId) -> Result<Option<Album>, AlbumRepositoryError>;

    /// Insert an album and return it with its generated identifier.
    async fn insert(&self, album: &NewAlbum) -> Result<Album, AlbumRepositoryError>;

    /// Delete an album; `false` when it did not exist.
    async fn delete(&self, id: AlbumId) -> Result<bool, AlbumRepositoryError>;
}
