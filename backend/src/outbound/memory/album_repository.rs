//! In-memory album catalogue.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{AlbumRepository, AlbumRepositoryError};
use crate::domain::{Album, AlbumId, NewAlbum};

use super::next_id;

#[derive(Default)]
struct AlbumTable {
    last_id: i32,
    rows: BTreeMap<AlbumId, Album>,
}

/// Album store held in process memory, listed in id order.
#[derive(Default)]
pub struct InMemoryAlbumRepository {
    table: Mutex<AlbumTable>,
}

impl InMemoryAlbumRepository {
    /// Empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlbumRepository for InMemoryAlbumRepository {
    async fn list(&self) -> Result<Vec<Album>, AlbumRepositoryError> {
        Ok(self.table.lock().await.rows.values().cloned().collect())
    }

    async fn find(&self, id: AlbumId) -> Result<Option<Album>, AlbumRepositoryError> {
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn insert(&self, album: &NewAlbum) -> Result<Album, AlbumRepositoryError> {
        let mut table = self.table.lock().await;
        let id = AlbumId::new(next_id(&mut table.last_id));
        let stored = album.clone().into_album(id);
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: AlbumId) -> Result<bool, AlbumRepositoryError> {
        Ok(self.table.lock().await.rows.remove(&id).is_some())
    }
}
