//! Catalogue use-cases: album listing, admin maintenance, and forwarding
//! add-to-cart requests with the album details the catalogue already holds.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::{
    AlbumRepository, AlbumRepositoryError, AuthClient, AuthClientError, CartAddReceipt,
    CartAddRequest, CartClient, CartClientError, CoverStore, CoverStoreError,
};
use crate::domain::{
    Album, AlbumDetails, AlbumId, CartSessionId, Error, NewAlbum, Quantity, SessionToken,
    UserProfile,
};

/// Cover file received with an album creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverUpload {
    /// Client-side file name.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Ports required by [`CatalogService`].
#[derive(Clone)]
pub struct CatalogPorts {
    /// Album storage.
    pub albums: Arc<dyn AlbumRepository>,
    /// Cover upload storage.
    pub covers: Arc<dyn CoverStore>,
    /// Token verification.
    pub auth: Arc<dyn AuthClient>,
    /// Cart forwarding.
    pub cart: Arc<dyn CartClient>,
}

/// Catalogue application service.
#[derive(Clone)]
pub struct CatalogService {
    albums: Arc<dyn AlbumRepository>,
    covers: Arc<dyn CoverStore>,
    auth: Arc<dyn AuthClient>,
    cart: Arc<dyn CartClient>,
}

impl CatalogService {
    /// Build the service from its ports.
    #[must_use]
    pub fn new(ports: CatalogPorts) -> Self {
        Self {
            albums: ports.albums,
            covers: ports.covers,
            auth: ports.auth,
            cart: ports.cart,
        }
    }

    /// Every album, unfiltered and unpaginated.
    ///
    /// # Errors
    /// Returns a domain error when the store is unavailable.
    pub async fn list_albums(&self) -> Result<Vec<Album>, Error> {
        self.albums.list().await.map_err(map_album_error)
    }

    /// Fetch one album.
    ///
    /// # Errors
    /// Returns `not_found` when the album does not exist.
    pub async fn get_album(&self, id: AlbumId) -> Result<Album, Error> {
        self.albums
            .find(id)
            .await
            .map_err(map_album_error)?
            .ok_or_else(|| Error::not_found("Album not found"))
    }

    /// Resolve a bearer token to an administrator.
    ///
    /// # Errors
    /// `unauthorized` without a valid token, `forbidden` for non-admin users,
    /// and `service_unavailable` when the users service cannot be reached.
    pub async fn authorize_admin(&self, token: Option<&SessionToken>) -> Result<UserProfile, Error> {
        let token = token.ok_or_else(|| Error::unauthorized("Authentication required"))?;
        let profile = self
            .auth
            .verify(token)
            .await
            .map_err(map_auth_error)?
            .ok_or_else(|| Error::unauthorized("Invalid or expired token"))?;
        if !profile.role.is_admin() {
            return Err(Error::forbidden("Admin access required"));
        }
        Ok(profile)
    }

    /// Create an album. An uploaded cover wins over a cover URL.
    ///
    /// # Errors
    /// Authorisation failures as for [`Self::authorize_admin`], plus storage
    /// failures for the cover or the album.
    pub async fn create_album(
        &self,
        token: Option<&SessionToken>,
        album: NewAlbum,
        upload: Option<CoverUpload>,
    ) -> Result<Album, Error> {
        let admin = self.authorize_admin(token).await?;
        let album = match upload.filter(|upload| !upload.bytes.is_empty()) {
            Some(upload) => {
                let reference = self
                    .covers
                    .store(&upload.file_name, &upload.bytes)
                    .await
                    .map_err(map_cover_error)?;
                album.with_cover(Some(reference))
            }
            None => album,
        };
        let created = self.albums.insert(&album).await.map_err(map_album_error)?;
        info!(album_id = %created.id, admin = %admin.username, "album created");
        Ok(created)
    }

    /// Delete an album without checking cart or order references. Deleting a
    /// missing album succeeds.
    ///
    /// # Errors
    /// Authorisation or storage failures.
    pub async fn delete_album(&self, token: Option<&SessionToken>, id: AlbumId) -> Result<(), Error> {
        let admin = self.authorize_admin(token).await?;
        let existed = self.albums.delete(id).await.map_err(map_album_error)?;
        if existed {
            info!(album_id = %id, admin = %admin.username, "album deleted");
        } else {
            warn!(album_id = %id, "delete requested for missing album");
        }
        Ok(())
    }

    /// Forward an add-to-cart request with the album's details attached so
    /// the cart service does not call back into the catalogue.
    ///
    /// # Errors
    /// `not_found` for unknown albums; cart failures are mapped by status.
    pub async fn add_to_cart(
        &self,
        session_id: Option<CartSessionId>,
        album_id: AlbumId,
        quantity: Quantity,
    ) -> Result<CartAddReceipt, Error> {
        let album = self.get_album(album_id).await?;
        let request = CartAddRequest {
            session_id,
            album: AlbumDetails {
                album_id: album.id,
                album_name: album.name,
                artist: album.artist,
                price: album.price,
                cover_url: album.cover_url,
            },
            quantity,
        };
        self.cart.add_to_cart(&request).await.map_err(map_cart_error)
    }
}

fn map_album_error(error: AlbumRepositoryError) -> Error {
    match error {
        AlbumRepositoryError::Connection { message } => {
            warn!(%message, "album store unavailable");
            Error::service_unavailable("Catalog store unavailable")
        }
        AlbumRepositoryError::Query { message } => {
            Error::internal(format!("album query failed: {message}"))
        }
    }
}

fn map_cover_error(error: CoverStoreError) -> Error {
    match error {
        CoverStoreError::InvalidName { .. } => Error::invalid_request(error.to_string()),
        CoverStoreError::Io { message } => Error::internal(format!("cover upload failed: {message}")),
    }
}

fn map_auth_error(error: AuthClientError) -> Error {
    warn!(%error, "token verification failed");
    match error {
        AuthClientError::Decode { .. } => Error::internal("Unexpected users service response"),
        AuthClientError::Status { .. } | AuthClientError::Transport { .. } => {
            Error::service_unavailable("Users service unavailable. Please try again later.")
        }
    }
}

fn map_cart_error(error: CartClientError) -> Error {
    warn!(%error, "add to cart forwarding failed");
    match error {
        CartClientError::Status { status: 404, message } => Error::not_found(message),
        CartClientError::Status { status, message } if status < 500 => {
            Error::invalid_request(message)
        }
        CartClientError::Status { .. } | CartClientError::Transport { .. } => {
            Error::service_unavailable("Cart service unavailable. Please try again later.")
        }
        CartClientError::Decode { .. } => Error::internal("Unexpected cart service response"),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        MockAlbumRepository, MockAuthClient, MockCartClient, MockCoverStore,
    };
    use crate::domain::{Price, Role, UserId};
    use mockall::predicate::eq;
    use rstest::rstest;

    fn album(id: i32) -> Album {
        Album {
            id: AlbumId::new(id),
            name: "Reign in Blood".to_owned(),
            artist: "Slayer".to_owned(),
            price: Price::parse("19.99").expect("valid price"),
            cover_url: None,
        }
    }

    fn profile(role: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(1),
            username: "admin".to_owned(),
            role: Role::from_stored(role),
        }
    }

    fn token() -> SessionToken {
        SessionToken::parse("token").expect("token")
    }

    struct Mocks {
        albums: MockAlbumRepository,
        covers: MockCoverStore,
        auth: MockAuthClient,
        cart: MockCartClient,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                albums: MockAlbumRepository::new(),
                covers: MockCoverStore::new(),
                auth: MockAuthClient::new(),
                cart: MockCartClient::new(),
            }
        }

        fn admin(mut self) -> Self {
            self.auth
                .expect_verify()
                .returning(|_| Ok(Some(profile("admin"))));
            self
        }

        fn build(self) -> CatalogService {
            CatalogService::new(CatalogPorts {
                albums: Arc::new(self.albums),
                covers: Arc::new(self.covers),
                auth: Arc::new(self.auth),
                cart: Arc::new(self.cart),
            })
        }
    }

    #[tokio::test]
    async fn missing_album_is_not_found() {
        let mut mocks = Mocks::new();
        mocks.albums.expect_find().returning(|_| Ok(None));
        let err = mocks
            .build()
            .get_album(AlbumId::new(9))
            .await
            .expect_err("missing album");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case(None, ErrorCode::Unauthorized)]
    #[case(Some(Ok(None)), ErrorCode::Unauthorized)]
    #[case(Some(Ok(Some("user"))), ErrorCode::Forbidden)]
    #[case(Some(Err(AuthClientError::transport("refused"))), ErrorCode::ServiceUnavailable)]
    #[tokio::test]
    async fn admin_checks(
        #[case] verification: Option<Result<Option<&'static str>, AuthClientError>>,
        #[case] expected: ErrorCode,
    ) {
        let mut mocks = Mocks::new();
        let presented = verification.as_ref().map(|_| token());
        if let Some(result) = verification {
            mocks.auth.expect_verify().return_once(move |_| {
                result.map(|maybe| maybe.map(profile))
            });
        }
        let err = mocks
            .build()
            .authorize_admin(presented.as_ref())
            .await
            .expect_err("authorisation must fail");
        assert_eq!(err.code(), expected);
    }

    #[tokio::test]
    async fn uploaded_cover_wins_over_url() {
        let mut mocks = Mocks::new().admin();
        mocks
            .covers
            .expect_store()
            .withf(|name, bytes| name == "cover.png" && bytes == b"png")
            .returning(|_, _| Ok("/static/uploads/cover.png".to_owned()));
        mocks
            .albums
            .expect_insert()
            .withf(|album| album.cover_url() == Some("/static/uploads/cover.png"))
            .returning(|album| Ok(album.clone().into_album(AlbumId::new(1))));
        let new_album = NewAlbum::try_from_parts("X", "Y", "9.99")
            .expect("valid album")
            .with_cover(Some("http://example.com/x.jpg".to_owned()));
        let created = mocks
            .build()
            .create_album(
                Some(&token()),
                new_album,
                Some(CoverUpload {
                    file_name: "cover.png".to_owned(),
                    bytes: b"png".to_vec(),
                }),
            )
            .await
            .expect("album created");
        assert_eq!(created.cover_url.as_deref(), Some("/static/uploads/cover.png"));
    }

    #[tokio::test]
    async fn empty_upload_keeps_url() {
        let mut mocks = Mocks::new().admin();
        mocks.covers.expect_store().never();
        mocks
            .albums
            .expect_insert()
            .returning(|album| Ok(album.clone().into_album(AlbumId::new(2))));
        let new_album = NewAlbum::try_from_parts("X", "Y", "9.99")
            .expect("valid album")
            .with_cover(Some("http://example.com/x.jpg".to_owned()));
        let created = mocks
            .build()
            .create_album(
                Some(&token()),
                new_album,
                Some(CoverUpload {
                    file_name: String::new(),
                    bytes: Vec::new(),
                }),
            )
            .await
            .expect("album created");
        assert_eq!(created.cover_url.as_deref(), Some("http://example.com/x.jpg"));
    }

    #[tokio::test]
    async fn non_admin_cannot_delete() {
        let mut mocks = Mocks::new();
        mocks
            .auth
            .expect_verify()
            .returning(|_| Ok(Some(profile("user"))));
        mocks.albums.expect_delete().never();
        let err = mocks
            .build()
            .delete_album(Some(&token()), AlbumId::new(1))
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn add_to_cart_forwards_album_details() {
        let mut mocks = Mocks::new();
        mocks
            .albums
            .expect_find()
            .with(eq(AlbumId::new(3)))
            .returning(|id| Ok(Some(album(id.get()))));
        mocks
            .cart
            .expect_add_to_cart()
            .withf(|request| {
                request.album.album_name == "Reign in Blood"
                    && request.quantity.get() == 2
                    && request.session_id.is_none()
            })
            .returning(|_| {
                Ok(CartAddReceipt {
                    session_id: CartSessionId::parse("0123456789abcdef0123456789abcdef").expect("session"),
                    message: "Item added to cart".to_owned(),
                })
            });
        let receipt = mocks
            .build()
            .add_to_cart(None, AlbumId::new(3), Quantity::new(2).expect("quantity"))
            .await
            .expect("forwarded");
        assert_eq!(receipt.session_id.as_str(), "abc");
    }

    #[rstest]
    #[case(CartClientError::status(404_u16, "Album not found"), ErrorCode::NotFound)]
    #[case(CartClientError::status(400_u16, "bad"), ErrorCode::InvalidRequest)]
    #[case(CartClientError::status(503_u16, "down"), ErrorCode::ServiceUnavailable)]
    #[case(CartClientError::transport("timeout"), ErrorCode::ServiceUnavailable)]
    fn cart_errors_map_by_status(#[case] error: CartClientError, #[case] expected: ErrorCode) {
        assert_eq!(map_cart_error(error).code(), expected);
    }
}
