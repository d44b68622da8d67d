//! Shared HTTP adapter state, one bundle per service.
//!
//! HTTP handlers accept these via `actix_web::web::Data` so they only depend
//! on domain services and remain testable with mocked ports.

use crate::domain::{AuthService, CartService, CatalogService, CheckoutService, OrderService};

/// Dependencies for the catalogue handlers.
#[derive(Clone)]
pub struct CatalogState {
    pub catalog: CatalogService,
    /// Browser-facing base URL of the cart service, without a trailing slash.
    pub cart_public_url: String,
}

impl CatalogState {
    /// Bundle the catalogue service with the cart's public URL.
    pub fn new(catalog: CatalogService, cart_public_url: impl Into<String>) -> Self {
        let url: String = cart_public_url.into();
        Self {
            catalog,
            cart_public_url: url.trim_end_matches('/').to_owned(),
        }
    }

    /// Absolute cart URL for `path`, carrying the cart session when known.
    #[must_use]
    pub fn cart_url(&self, path: &str, session: Option<&str>) -> String {
        match session {
            Some(id) => format!("{}{path}?session_id={id}", self.cart_public_url),
            None => format!("{}{path}", self.cart_public_url),
        }
    }
}

/// Dependencies for the cart and checkout handlers.
#[derive(Clone)]
pub struct CartState {
    pub cart: CartService,
    pub checkout: CheckoutService,
}

impl CartState {
    #[must_use]
    pub const fn new(cart: CartService, checkout: CheckoutService) -> Self {
        Self { cart, checkout }
    }
}

/// Dependencies for the order handlers.
#[derive(Clone)]
pub struct OrderState {
    pub orders: OrderService,
}

impl OrderState {
    #[must_use]
    pub const fn new(orders: OrderService) -> Self {
        Self { orders }
    }
}

/// Dependencies for the users handlers.
#[derive(Clone)]
pub struct UsersState {
    pub auth: AuthService,
}

impl UsersState {
    #[must_use]
    pub const fn new(auth: AuthService) -> Self {
        Self { auth }
    }
}
