//! Port used by the cart service to resolve album details from the catalogue.

use async_trait::async_trait;

use crate::domain::retry::Transient;
use crate::domain::{AlbumDetails, AlbumId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalogue client adapters.
    pub enum CatalogClientError {
        /// The catalogue answered with a non-success status.
        Status { status: u16 } => "Album not found. Status: {status}",
        /// The catalogue could not be reached.
        Transport { message: String } => "catalog service unavailable: {message}",
        /// The catalogue response could not be decoded.
        Decode { message: String } => "invalid catalog response: {message}",
    }
}

impl Transient for CatalogClientError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Status { status } => *status >= 500,
            Self::Transport { .. } => true,
            Self::Decode { .. } => false,
        }
    }
}

/// Read access to the catalogue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the details a cart line copies from an album.
    async fn fetch_album(&self, id: AlbumId) -> Result<AlbumDetails, CatalogClientError>;
}
