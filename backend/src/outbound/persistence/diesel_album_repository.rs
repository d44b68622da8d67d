//! PostgreSQL-backed `AlbumRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AlbumRepository, AlbumRepositoryError};
use crate::domain::{Album, AlbumId, NewAlbum, Price};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AlbumRow, NewAlbumRow};
use super::pool::{DbPool, PoolError};
use super::schema::albums;

/// Diesel implementation of the catalogue store.
#[derive(Clone)]
pub struct DieselAlbumRepository {
    pool: DbPool,
}

impl DieselAlbumRepository {
    /// Create a repository over `pool`.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> AlbumRepositoryError {
    map_pool_error(error, AlbumRepositoryError::connection)
}

fn diesel_error(error: &diesel::result::Error) -> AlbumRepositoryError {
    map_diesel_error(
        error,
        AlbumRepositoryError::query,
        AlbumRepositoryError::connection,
    )
}

fn row_to_album(row: AlbumRow) -> Result<Album, AlbumRepositoryError> {
    let price = Price::from_cents(row.price_cents).map_err(|err| {
        AlbumRepositoryError::query(format!("album {} has an invalid price: {err}", row.id))
    })?;
    Ok(Album {
        id: AlbumId::new(row.id),
        name: row.name,
        artist: row.artist,
        price,
        cover_url: row.cover_url,
    })
}

#[async_trait]
impl AlbumRepository for DieselAlbumRepository {
    async fn list(&self) -> Result<Vec<Album>, AlbumRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<AlbumRow> = albums::table
            .order(albums::id.asc())
            .select(AlbumRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        rows.into_iter().map(row_to_album).collect()
    }

    async fn find(&self, id: AlbumId) -> Result<Option<Album>, AlbumRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<AlbumRow> = albums::table
            .find(id.get())
            .select(AlbumRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        row.map(row_to_album).transpose()
    }

    async fn insert(&self, album: &NewAlbum) -> Result<Album, AlbumRepositoryError> {
        let price_cents = album
            .price()
            .try_to_cents()
            .map_err(|err| AlbumRepositoryError::query(err.to_string()))?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: AlbumRow = diesel::insert_into(albums::table)
            .values(NewAlbumRow {
                name: album.name(),
                artist: album.artist(),
                price_cents,
                cover_url: album.cover_url(),
            })
            .returning(AlbumRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        row_to_album(row)
    }

    async fn delete(&self, id: AlbumId) -> Result<bool, AlbumRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(albums::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        Ok(deleted > 0)
    }
}
