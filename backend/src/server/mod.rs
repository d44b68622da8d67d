//! Per-service assembly: stores, clients, middleware, and HTTP servers.
//!
//! Each service module exposes three layers so tests can stop at any of
//! them: a state builder reading settings, an `App` builder taking ready
//! state, and a server constructor binding the listener.

mod cart;
mod catalog;
mod config;
mod order;
mod users;

use std::io;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use tracing::{info, warn};

use crate::inbound::http::session_config::{SessionConfigError, SessionSettings};
use crate::outbound::http::ClientConfigError;
use crate::outbound::persistence::{
    DbPool, MigrationError, MigrationSet, PoolConfig, PoolError, run_migrations,
};

pub use cart::{CART_SERVICE, build_cart_state, cart_app, cart_server};
pub use catalog::{CATALOG_SERVICE, build_catalog_state, catalog_app, catalog_server};
pub use config::{CartSettings, CatalogSettings, OrderSettings, UsersSettings};
pub use order::{ORDER_SERVICE, build_order_state, order_app, order_server};
pub use users::{USERS_SERVICE, build_users_state, users_app, users_server};

/// Cookie holding the catalogue's copy of the cart session id.
pub const CATALOG_SESSION_COOKIE: &str = "catalog_session";
/// Cookie holding the cart service's session.
pub const CART_SESSION_COOKIE: &str = "cart_session";

/// Failures while bringing a service up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Session cookie settings were rejected.
    #[error(transparent)]
    Session(#[from] SessionConfigError),
    /// Schema migrations failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),
    /// The connection pool could not be built.
    #[error("database pool: {0}")]
    Pool(#[from] PoolError),
    /// A service client was misconfigured.
    #[error(transparent)]
    Client(#[from] ClientConfigError),
    /// Start-up work against the stores failed.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] crate::domain::Error),
    /// Binding the listener or preparing directories failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Migrate and connect when a database URL is configured; `None` selects
/// the in-memory stores.
async fn connect_store(
    service: &'static str,
    database_url: Option<&str>,
    max_connections: u32,
    set: MigrationSet,
) -> Result<Option<DbPool>, StartupError> {
    let Some(url) = database_url.filter(|url| !url.trim().is_empty()) else {
        warn!(service, "no database URL configured; using in-memory store");
        return Ok(None);
    };
    let applied = run_migrations(url, set).await?;
    info!(service, applied, "database migrations applied");
    let pool = DbPool::new(PoolConfig::new(url).with_max_size(max_connections)).await?;
    Ok(Some(pool))
}

/// Encrypted cookie session for the browser-facing services.
fn session_middleware(settings: &SessionSettings) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), settings.key.clone())
        .cookie_name(settings.cookie_name.clone())
        .cookie_path("/".into())
        .cookie_secure(settings.cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(settings.same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::days(7)),
        )
        .build()
}
