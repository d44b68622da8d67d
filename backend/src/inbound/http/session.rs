//! Cart session helpers so handlers stay free of Actix session details.
//!
//! The cart session id is resolved in a fixed order: a well-formed explicit
//! id supplied with the request, then the id already held in the cookie,
//! then (only where a cart may be created) a freshly generated id. An
//! accepted explicit id is written back to the cookie so the catalogue to
//! cart hand-off survives the redirect.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::domain::{CartSessionId, Error, OrderReceipt};

pub(crate) const CART_SESSION_KEY: &str = "cart_session_id";
pub(crate) const LAST_ORDER_KEY: &str = "last_order";

/// Parse an explicit session id sent by a client. Blank values count as
/// absent.
///
/// # Errors
/// `invalid_request` when the value is present but malformed.
pub fn explicit_session_id(raw: Option<&str>) -> Result<Option<CartSessionId>, Error> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => CartSessionId::parse(value)
            .map(Some)
            .map_err(|err| Error::invalid_request(format!("invalid session_id: {err}"))),
        None => Ok(None),
    }
}

/// Lenient variant of [`explicit_session_id`] for HTML pages: malformed ids
/// are ignored.
#[must_use]
pub fn explicit_session_id_lenient(raw: Option<&str>) -> Option<CartSessionId> {
    explicit_session_id(raw).unwrap_or_else(|err| {
        debug!(error = %err, "ignoring malformed session id");
        None
    })
}

/// Newtype wrapper exposing cart session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }

    /// Remember `id` in the session cookie.
    ///
    /// # Errors
    /// Internal error when the cookie cannot be written.
    pub fn persist_cart_session(&self, id: &CartSessionId) -> Result<(), Error> {
        self.0
            .insert(CART_SESSION_KEY, id.as_str())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Cart session id held in the cookie, if it is present and well formed.
    ///
    /// # Errors
    /// Internal error when the cookie cannot be read.
    pub fn cart_session(&self) -> Result<Option<CartSessionId>, Error> {
        let raw = self
            .0
            .get::<String>(CART_SESSION_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|raw| match CartSessionId::parse(&raw) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(%error, "invalid cart session id in cookie");
                None
            }
        }))
    }

    /// Resolve the session without creating one.
    ///
    /// # Errors
    /// Internal error when the cookie cannot be read or written.
    pub fn resolve(&self, explicit: Option<CartSessionId>) -> Result<Option<CartSessionId>, Error> {
        match explicit {
            Some(id) => {
                self.persist_cart_session(&id)?;
                Ok(Some(id))
            }
            None => self.cart_session(),
        }
    }

    /// Resolve the session, generating and persisting one when none exists.
    ///
    /// # Errors
    /// Internal error when the cookie cannot be read or written.
    pub fn resolve_or_start(&self, explicit: Option<CartSessionId>) -> Result<CartSessionId, Error> {
        if let Some(id) = self.resolve(explicit)? {
            return Ok(id);
        }
        let id = CartSessionId::generate();
        self.persist_cart_session(&id)?;
        debug!(session = %id, "started cart session");
        Ok(id)
    }
}

impl SessionContext {
    /// Keep the receipt of the order just placed for the confirmation page.
    ///
    /// # Errors
    /// Internal error when the cookie cannot be written.
    pub fn remember_order(&self, receipt: &OrderReceipt) -> Result<(), Error> {
        self.0
            .insert(LAST_ORDER_KEY, receipt)
            .map_err(|error| Error::internal(format!("failed to persist order receipt: {error}")))
    }

    /// Receipt stored by [`Self::remember_order`], removed on read. Unreadable
    /// receipts are dropped.
    #[must_use]
    pub fn take_last_order(&self) -> Option<OrderReceipt> {
        match self.0.remove_as::<OrderReceipt>(LAST_ORDER_KEY)? {
            Ok(receipt) => Some(receipt),
            Err(raw) => {
                warn!(%raw, "discarding unreadable order receipt");
                None
            }
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(Self::new) })
    }
}
