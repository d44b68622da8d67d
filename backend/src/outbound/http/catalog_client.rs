//! Catalogue lookups used by the cart service.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::ServiceEndpoint;
use crate::domain::ports::{CatalogClient, CatalogClientError};
use crate::domain::{Album, AlbumDetails, AlbumId, retry_with_backoff};

/// `GET {catalog}/api/album/{id}` client.
#[derive(Clone)]
pub struct HttpCatalogClient {
    endpoint: ServiceEndpoint,
}

impl HttpCatalogClient {
    /// Client for the catalogue behind `endpoint`. Reads are safe to retry.
    #[must_use]
    pub const fn new(endpoint: ServiceEndpoint) -> Self {
        Self { endpoint }
    }

    async fn fetch_once(&self, id: AlbumId) -> Result<AlbumDetails, CatalogClientError> {
        let response = self
            .endpoint
            .get(&format!("/api/album/{id}"))
            .send()
            .await
            .map_err(|err| CatalogClientError::transport(err.to_string()))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(CatalogClientError::status(status.as_u16()));
        }
        let album: Album = response
            .json()
            .await
            .map_err(|err| CatalogClientError::decode(err.to_string()))?;
        Ok(album_details(album))
    }
}

fn album_details(album: Album) -> AlbumDetails {
    AlbumDetails {
        album_id: album.id,
        album_name: album.name,
        artist: album.artist,
        price: album.price,
        cover_url: album.cover_url,
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_album(&self, id: AlbumId) -> Result<AlbumDetails, CatalogClientError> {
        debug!(album_id = %id, "fetching album from catalog");
        retry_with_backoff(
            self.endpoint.retry,
            self.endpoint.sleeper.as_ref(),
            "catalog.fetch_album",
            |_| self.fetch_once(id),
        )
        .await
    }
}
