//! OpenAPI documentation, one document per service.
//!
//! Each service serves its own document through Swagger UI in debug builds.
//! Only the JSON endpoints are described; HTML pages and form redirects are
//! left out.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};

/// Register the bearer token scheme issued by `POST /api/login`.
struct BearerAddon;

impl Modify for BearerAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// Catalogue service document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront catalog service",
        description = "Album listing and lookup."
    ),
    paths(
        crate::inbound::http::catalog::list_albums,
        crate::inbound::http::catalog::get_album,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "catalog", description = "Album catalogue"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct CatalogApiDoc;

/// Cart service document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront cart service",
        description = "Session carts fed by the catalogue."
    ),
    paths(
        crate::inbound::http::cart::add_to_cart,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "cart", description = "Shopping carts"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct CartApiDoc;

/// Order service document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront order service",
        description = "Order persistence with idempotent creation."
    ),
    paths(
        crate::inbound::http::orders::create_order,
        crate::inbound::http::orders::list_orders,
        crate::inbound::http::orders::get_order,
        crate::inbound::http::orders::update_status,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "orders", description = "Orders"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct OrderApiDoc;

/// Users service document.
#[derive(OpenApi)]
#[openapi(
    modifiers(&BearerAddon),
    info(
        title = "Storefront users service",
        description = "Login, token verification, and user listing."
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::verify,
        crate::inbound::http::users::refresh,
        crate::inbound::http::users::list_users,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "users", description = "Operations related to users"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct UsersApiDoc;
