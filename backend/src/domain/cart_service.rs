//! Cart use-cases: adding, updating, and removing lines under a session.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{
    CartRepository, CartRepositoryError, CatalogClient, CatalogClientError,
};
use crate::domain::{
    AlbumDetails, AlbumId, Cart, CartItem, CartItemId, CartSessionId, Error, Quantity,
};

/// Cart application service.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn CatalogClient>,
}

impl CartService {
    /// Build the service from its ports.
    #[must_use]
    pub fn new(carts: Arc<dyn CartRepository>, catalog: Arc<dyn CatalogClient>) -> Self {
        Self { carts, catalog }
    }

    /// Current contents of a session's cart.
    ///
    /// # Errors
    /// Returns a domain error when the cart store fails.
    pub async fn view(&self, session: &CartSessionId) -> Result<Cart, Error> {
        let items = self.carts.list(session).await.map_err(map_cart_error)?;
        Ok(Cart::new(session.clone(), items))
    }

    /// Add an album to the cart, summing quantities on repeat adds. Album
    /// details are fetched from the catalogue when the caller did not send
    /// them.
    ///
    /// # Errors
    /// `not_found` when the catalogue does not return the album,
    /// `service_unavailable` when it cannot be reached.
    pub async fn add(
        &self,
        session: &CartSessionId,
        album_id: AlbumId,
        quantity: Quantity,
        details: Option<AlbumDetails>,
    ) -> Result<CartItem, Error> {
        let details = match details {
            Some(details) => details,
            None => {
                debug!(album_id = %album_id, "resolving album details from catalog");
                self.catalog
                    .fetch_album(album_id)
                    .await
                    .map_err(map_catalog_error)?
            }
        };
        self.carts
            .add(session, &details, quantity)
            .await
            .map_err(map_cart_error)
    }

    /// Set a line's quantity; zero or less removes the line. Lines owned by
    /// another session are left alone.
    ///
    /// # Errors
    /// Returns a domain error when the cart store fails.
    pub async fn update_quantity(
        &self,
        session: &CartSessionId,
        item: CartItemId,
        quantity: i64,
    ) -> Result<(), Error> {
        let changed = match Quantity::new(quantity) {
            Ok(quantity) => self
                .carts
                .set_quantity(session, item, quantity)
                .await
                .map_err(map_cart_error)?,
            Err(_) if quantity <= 0 => self
                .carts
                .remove(session, item)
                .await
                .map_err(map_cart_error)?,
            Err(err) => return Err(Error::invalid_request(err.to_string())),
        };
        if !changed {
            debug!(item_id = %item, "quantity update matched no line");
        }
        Ok(())
    }

    /// Remove one line from the session's cart.
    ///
    /// # Errors
    /// Returns a domain error when the cart store fails.
    pub async fn remove(&self, session: &CartSessionId, item: CartItemId) -> Result<(), Error> {
        self.carts
            .remove(session, item)
            .await
            .map_err(map_cart_error)?;
        Ok(())
    }
}

pub(crate) fn map_cart_error(error: CartRepositoryError) -> Error {
    match error {
        CartRepositoryError::Connection { message } => {
            warn!(%message, "cart store unavailable");
            Error::service_unavailable("Cart store unavailable")
        }
        CartRepositoryError::Query { message } => {
            Error::internal(format!("cart query failed: {message}"))
        }
    }
}

fn map_catalog_error(error: CatalogClientError) -> Error {
    match error {
        CatalogClientError::Status { .. } => Error::not_found(error.to_string()),
        CatalogClientError::Transport { message } => {
            warn!(%message, "catalog unreachable");
            Error::service_unavailable("Store service unavailable")
        }
        CatalogClientError::Decode { message } => {
            Error::internal(format!("catalog response invalid: {message}"))
        }
    }
}
